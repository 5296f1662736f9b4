//! Parlance speech crate - hosted speech-to-text and text-to-speech.
//!
//! Provides trait-based abstractions for transcription and synthesis, the
//! audio format rules for uploads, and HTTP clients for OpenAI-compatible
//! speech APIs.

pub mod client;
pub mod error;
pub mod format;

use async_trait::async_trait;
use futures::stream::BoxStream;

pub use client::{SpeechSynthesisClient, TranscriptionClient};
pub use error::SpeechError;
pub use format::AudioFormat;

/// Encoded audio produced by a [`Synthesizer`], chunk by chunk.
pub type AudioStream = BoxStream<'static, Result<Vec<u8>, SpeechError>>;

// =============================================================================
// Traits
// =============================================================================

/// Service for turning recorded audio into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one recording in the given container format.
    async fn transcribe(&self, audio: Vec<u8>, format: AudioFormat) -> Result<String, SpeechError>;
}

/// Service for turning text into spoken audio.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// MIME type of the bytes produced by [`Synthesizer::synthesize`].
    fn content_type(&self) -> &'static str {
        "audio/mpeg"
    }

    /// Start synthesis and return the audio as it arrives.
    async fn synthesize(&self, text: &str) -> Result<AudioStream, SpeechError>;
}

// =============================================================================
// Validation
// =============================================================================

/// Trim `text` and check it against the synthesis length limit.
pub fn validate_tts_text(text: &str, max_chars: usize) -> Result<&str, SpeechError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SpeechError::EmptyText);
    }
    let len = text.chars().count();
    if len > max_chars {
        return Err(SpeechError::TextTooLong { len, max: max_chars });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tts_text() {
        assert_eq!(validate_tts_text("  hello  ", 10).unwrap(), "hello");
        assert!(matches!(validate_tts_text("   ", 10), Err(SpeechError::EmptyText)));
        assert!(matches!(
            validate_tts_text("abcdef", 5),
            Err(SpeechError::TextTooLong { len: 6, max: 5 })
        ));
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        assert!(validate_tts_text("héllo", 5).is_ok());
    }
}
