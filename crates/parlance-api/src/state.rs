//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use parlance_chat::ChatOrchestrator;
use parlance_core::ParlanceConfig;
use parlance_speech::{Synthesizer, Transcriber};

/// Shared application state.
///
/// All fields are cheap to clone across handler tasks. Nothing here is
/// mutable: conversations live in the browser.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ParlanceConfig>,
    pub orchestrator: ChatOrchestrator,
    pub transcriber: Arc<dyn Transcriber>,
    pub synthesizer: Arc<dyn Synthesizer>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: ParlanceConfig,
        orchestrator: ChatOrchestrator,
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator,
            transcriber,
            synthesizer,
            start_time: Instant::now(),
        }
    }
}
