//! Parlance application binary - composition root.
//!
//! 1. Parse CLI flags and initialize tracing
//! 2. Load configuration from TOML and secrets from the environment
//! 3. Build the chat, database, and speech clients
//! 4. Start the axum HTTP server

mod cli;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use parlance_api::{start_server, AppState};
use parlance_chat::{build_system_prompt, ChatOrchestrator};
use parlance_core::{ParlanceConfig, ParlanceError, Secrets};
use parlance_db::{Catalog, QueryTools, RestDatabase};
use parlance_llm::OpenAiClientBuilder;
use parlance_speech::{SpeechSynthesisClient, TranscriptionClient};

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config_exists = config_file.exists();
    let mut config = if config_exists {
        match ParlanceConfig::load(&config_file) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Invalid configuration in {}: {}", config_file.display(), e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        ParlanceConfig::default()
    };
    args.apply(&mut config);

    // RUST_LOG wins over --log-level and the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    tracing::info!("Starting Parlance v{}", env!("CARGO_PKG_VERSION"));
    if config_exists {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::warn!(path = %config_file.display(), "No configuration file, using defaults");
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Parlance failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ParlanceConfig) -> Result<(), ParlanceError> {
    // Secrets are checked before anything binds.
    let secrets = Secrets::from_env()?;
    tracing::debug!(secrets = ?secrets, "Secrets loaded");

    let provider = OpenAiClientBuilder::new(secrets.chat_api_key.clone(), config.chat.model.clone())
        .base_url(config.chat.base_url.clone())
        .temperature(config.chat.temperature)
        .timeout(Duration::from_secs(config.chat.timeout_secs))
        .build()
        .map_err(|e| ParlanceError::Config(e.to_string()))?;
    tracing::info!(model = %config.chat.model, base_url = %config.chat.base_url, "Chat provider ready");

    let database = RestDatabase::new(
        &secrets.database_url,
        &config.database.rest_path,
        secrets.database_api_key.clone(),
        Duration::from_secs(config.database.timeout_secs),
    )
    .map_err(|e| ParlanceError::Config(e.to_string()))?;
    let catalog = Catalog::new(config.database.tables.clone());
    if catalog.is_empty() {
        tracing::warn!("database.tables is empty; structured query tools will reject every table");
    }
    tracing::info!(tables = ?catalog.names(), "Database catalog ready");

    let system_prompt = build_system_prompt(&catalog, config.chat.extra_instructions.as_deref());
    let tools = QueryTools::new(
        Arc::new(database),
        catalog,
        config.database.max_rows,
        config.database.sql_function.clone(),
    );
    let orchestrator = ChatOrchestrator::new(
        Arc::new(provider),
        Arc::new(tools),
        system_prompt,
        config.chat.max_tool_rounds,
    );

    let transcriber = TranscriptionClient::from_config(&config.speech, secrets.stt_api_key.clone())
        .map_err(|e| ParlanceError::Config(e.to_string()))?;
    let synthesizer = SpeechSynthesisClient::from_config(&config.speech, secrets.tts_api_key.clone())
        .map_err(|e| ParlanceError::Config(e.to_string()))?;

    let server_config = config.server.clone();
    let state = AppState::new(config, orchestrator, Arc::new(transcriber), Arc::new(synthesizer));

    start_server(&server_config, state).await
}
