//! Conversational interface for Parlance.
//!
//! Builds the system prompt from the table catalog and drives the
//! completion / tool-call loop, either to a single reply or as a stream of
//! events for the browser.

pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod types;

pub use error::ChatError;
pub use orchestrator::ChatOrchestrator;
pub use prompt::build_system_prompt;
pub use types::{AssistantReply, ChatEvent};
