use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ParlanceError, Result};

/// Top-level configuration for the Parlance service.
///
/// Loaded from `~/.parlance/config.toml` by default. API keys are never read
/// from this file; see [`Secrets`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParlanceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ParlanceConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParlanceConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Reject values that would make the service unusable.
    pub fn validate(&self) -> Result<()> {
        if self.chat.max_tool_rounds == 0 {
            return Err(ParlanceError::Config(
                "chat.max_tool_rounds must be at least 1".to_string(),
            ));
        }
        if self.database.max_rows == 0 {
            return Err(ParlanceError::Config(
                "database.max_rows must be at least 1".to_string(),
            ));
        }
        if self.server.rate_limit_per_sec == 0 {
            return Err(ParlanceError::Config(
                "server.rate_limit_per_sec must be at least 1".to_string(),
            ));
        }
        for (name, secs) in [
            ("chat", self.chat.timeout_secs),
            ("database", self.database.timeout_secs),
            ("speech", self.speech.timeout_secs),
        ] {
            if secs == 0 {
                return Err(ParlanceError::Config(format!(
                    "{}.timeout_secs must be at least 1",
                    name
                )));
            }
        }
        for table in &self.database.tables {
            if !is_identifier(&table.name) {
                return Err(ParlanceError::Config(format!(
                    "database.tables: '{}' is not a valid table or view name",
                    table.name
                )));
            }
        }
        Ok(())
    }
}

/// True for names made only of ASCII letters, digits, and underscores,
/// not starting with a digit.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Requests per second allowed across all `/api` routes.
    pub rate_limit_per_sec: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3040,
            rate_limit_per_sec: 20,
        }
    }
}

/// Hosted chat-completion provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL of an OpenAI-compatible chat-completions API.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on completion requests that may end in tool calls.
    pub max_tool_rounds: u32,
    /// Extra text appended to the generated system prompt.
    pub extra_instructions: Option<String>,
    /// Whole-request timeout, including a streamed answer.
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tool_rounds: 5,
            extra_instructions: None,
            timeout_secs: 120,
        }
    }
}

/// Whether a catalog entry is a base table or a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Table,
    View,
}

/// One queryable relation exposed to the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub kind: TableKind,
    /// Free-text description shown to the model, usually the column list.
    #[serde(default)]
    pub description: String,
}

impl TableSpec {
    fn new(name: &str, kind: TableKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
        }
    }
}

/// Hosted database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path of the REST interface under `DATABASE_URL`.
    pub rest_path: String,
    /// Server-side function that runs a read-only SQL string and returns JSON rows.
    pub sql_function: String,
    /// Hard cap on rows returned by any query tool.
    pub max_rows: u32,
    /// Tables and views the assistant may query.
    pub tables: Vec<TableSpec>,
    /// Per-request timeout for REST calls.
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            rest_path: "/rest/v1".to_string(),
            sql_function: "execute_readonly_sql".to_string(),
            max_rows: 200,
            timeout_secs: 15,
            tables: vec![
                TableSpec::new(
                    "customers",
                    TableKind::Table,
                    "id, name, email, region, created_at",
                ),
                TableSpec::new(
                    "products",
                    TableKind::Table,
                    "id, sku, name, category, unit_price",
                ),
                TableSpec::new(
                    "orders",
                    TableKind::Table,
                    "id, customer_id, status, total, ordered_at",
                ),
                TableSpec::new(
                    "order_items",
                    TableKind::Table,
                    "id, order_id, product_id, quantity, unit_price",
                ),
                TableSpec::new(
                    "monthly_revenue",
                    TableKind::View,
                    "month, region, order_count, revenue",
                ),
            ],
        }
    }
}

/// Hosted speech-to-text and text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Base URL of an OpenAI-compatible transcription API.
    pub stt_base_url: String,
    pub stt_model: String,
    /// Base URL of an OpenAI-compatible speech synthesis API.
    pub tts_base_url: String,
    pub tts_model: String,
    pub tts_voice: String,
    /// Largest accepted audio upload, in bytes.
    pub max_audio_bytes: usize,
    /// Longest accepted synthesis input, in characters.
    pub max_tts_chars: usize,
    /// Per-request timeout for transcription and synthesis, body included.
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            stt_base_url: "https://api.openai.com/v1".to_string(),
            stt_model: "whisper-1".to_string(),
            tts_base_url: "https://api.openai.com/v1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            max_audio_bytes: 25 * 1024 * 1024,
            max_tts_chars: 4096,
            timeout_secs: 60,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// API keys and endpoints read from the process environment at startup.
#[derive(Clone)]
pub struct Secrets {
    pub chat_api_key: String,
    pub stt_api_key: String,
    pub tts_api_key: String,
    pub database_url: String,
    pub database_api_key: String,
}

impl Secrets {
    pub const CHAT_API_KEY: &'static str = "CHAT_API_KEY";
    pub const STT_API_KEY: &'static str = "STT_API_KEY";
    pub const TTS_API_KEY: &'static str = "TTS_API_KEY";
    pub const DATABASE_URL: &'static str = "DATABASE_URL";
    pub const DATABASE_API_KEY: &'static str = "DATABASE_API_KEY";

    /// Read secrets from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read secrets through `lookup`. Blank values count as missing.
    ///
    /// `TTS_API_KEY` is optional and falls back to `STT_API_KEY`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| -> Option<String> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require =
            |name: &str| get(name).ok_or_else(|| ParlanceError::MissingEnv(name.to_string()));

        let chat_api_key = require(Self::CHAT_API_KEY)?;
        let stt_api_key = require(Self::STT_API_KEY)?;
        let database_url = require(Self::DATABASE_URL)?;
        let database_api_key = require(Self::DATABASE_API_KEY)?;
        let tts_api_key = get(Self::TTS_API_KEY).unwrap_or_else(|| stt_api_key.clone());

        Ok(Self {
            chat_api_key,
            stt_api_key,
            tts_api_key,
            database_url,
            database_api_key,
        })
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("chat_api_key", &"<redacted>")
            .field("stt_api_key", &"<redacted>")
            .field("tts_api_key", &"<redacted>")
            .field("database_url", &self.database_url)
            .field("database_api_key", &"<redacted>")
            .finish()
    }
}
