//! Error types for the speech crate.

use crate::format::AudioFormat;

/// Errors from audio validation or a hosted speech provider.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error(
        "unsupported audio format '{0}'; supported formats: {supported}",
        supported = AudioFormat::supported_list()
    )]
    UnsupportedFormat(String),

    #[error("audio is empty")]
    EmptyAudio,

    #[error("text is empty")]
    EmptyText,

    #[error("text is {len} characters; the limit is {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("network error: {0}")]
    Network(String),

    #[error("speech provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl SpeechError {
    /// HTTP status reported by the provider, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SpeechError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
