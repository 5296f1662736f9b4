//! Error types for the conversational interface.

use parlance_llm::LlmError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("conversation has no messages")]
    EmptyConversation,
    #[error("LLM error: {0}")]
    Provider(#[from] LlmError),
    #[error("client disconnected")]
    Disconnected,
}

impl ChatError {
    /// Message safe to show in the browser.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::EmptyConversation => self.to_string(),
            ChatError::Disconnected => self.to_string(),
            ChatError::Provider(e) => match e {
                LlmError::Api { status: 401 | 403, .. } => {
                    "authentication with the chat provider failed".to_string()
                }
                LlmError::Api { status: 429, .. } => {
                    "the chat provider is busy, please try again shortly".to_string()
                }
                LlmError::Network(_) => "could not reach the chat provider".to_string(),
                LlmError::Stream(_) => "the chat provider stopped responding mid-answer".to_string(),
                _ => "the chat provider returned an error".to_string(),
            },
        }
    }
}
