//! Error types for the chat-completion client.

/// Errors from a hosted chat-completion provider.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The request never got an HTTP response (DNS, TLS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),
    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },
    /// The response body was not the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The response stream broke off mid-way.
    #[error("stream error: {0}")]
    Stream(String),
}

impl LlmError {
    /// HTTP status reported by the provider, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
