//! CLI argument definitions for the Parlance server.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use parlance_core::ParlanceConfig;

/// Parlance - ask questions about your database by voice or text.
#[derive(Parser, Debug)]
#[command(name = "parlance", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Bind address.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// HTTP server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PARLANCE_CONFIG env var > ~/.parlance/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_with(|name| std::env::var(name).ok())
    }

    fn resolve_config_path_with<F>(&self, env: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = env("PARLANCE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path(&env)
    }

    /// Resolve the server port.
    ///
    /// Priority: --port flag > PARLANCE_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        self.resolve_port_with(config_port, |name| std::env::var(name).ok())
    }

    fn resolve_port_with<F>(&self, config_port: u16, env: F) -> u16
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(p) = self.port {
            return p;
        }
        env("PARLANCE_PORT")
            .and_then(|val| val.parse::<u16>().ok())
            .unwrap_or(config_port)
    }

    /// Apply flag overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut ParlanceConfig) {
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        config.server.port = self.resolve_port(config.server.port);
        if let Some(ref level) = self.log_level {
            config.logging.level = level.clone();
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path<F>(env: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let home = if cfg!(target_os = "windows") {
        env("USERPROFILE")
    } else {
        env("HOME")
    };
    match home {
        Some(home) => PathBuf::from(home).join(".parlance").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn args(argv: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("parlance").chain(argv.iter().copied()))
    }

    #[test]
    fn test_config_path_priority() {
        let cli = args(&["--config", "/etc/parlance.toml"]);
        assert_eq!(
            cli.resolve_config_path_with(env(&[("PARLANCE_CONFIG", "/tmp/x.toml")])),
            PathBuf::from("/etc/parlance.toml")
        );

        let cli = args(&[]);
        assert_eq!(
            cli.resolve_config_path_with(env(&[("PARLANCE_CONFIG", "/tmp/x.toml")])),
            PathBuf::from("/tmp/x.toml")
        );

        let home_var = if cfg!(target_os = "windows") { "USERPROFILE" } else { "HOME" };
        assert_eq!(
            cli.resolve_config_path_with(env(&[(home_var, "/home/ana")])),
            PathBuf::from("/home/ana").join(".parlance").join("config.toml")
        );
        assert_eq!(cli.resolve_config_path_with(env(&[])), PathBuf::from("config.toml"));
    }

    #[test]
    fn test_port_priority() {
        let cli = args(&["-p", "9000"]);
        assert_eq!(cli.resolve_port_with(3040, env(&[("PARLANCE_PORT", "8000")])), 9000);

        let cli = args(&[]);
        assert_eq!(cli.resolve_port_with(3040, env(&[("PARLANCE_PORT", "8000")])), 8000);
        assert_eq!(cli.resolve_port_with(3040, env(&[("PARLANCE_PORT", "nope")])), 3040);
        assert_eq!(cli.resolve_port_with(3040, env(&[])), 3040);
    }

    #[test]
    fn test_apply_overrides() {
        let cli = args(&["--host", "0.0.0.0", "--port", "8080", "--log-level", "debug"]);
        let mut config = ParlanceConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "debug");
    }
}
