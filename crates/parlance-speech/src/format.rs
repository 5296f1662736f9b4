//! Audio container detection for uploaded recordings.

use crate::error::SpeechError;

/// Audio containers accepted by the transcription endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Webm,
    Ogg,
    Mp3,
    Mp4,
    Wav,
    Flac,
}

impl AudioFormat {
    pub const SUPPORTED: [AudioFormat; 6] = [
        AudioFormat::Webm,
        AudioFormat::Ogg,
        AudioFormat::Mp3,
        AudioFormat::Mp4,
        AudioFormat::Wav,
        AudioFormat::Flac,
    ];

    /// Canonical MIME type sent upstream.
    pub fn mime(self) -> &'static str {
        match self {
            AudioFormat::Webm => "audio/webm",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Mp4 => "audio/mp4",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Flac => "audio/flac",
        }
    }

    /// File extension used for the upstream upload's file name.
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Webm => "webm",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Mp4 => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
        }
    }

    /// Comma-separated extensions, for error messages.
    pub fn supported_list() -> String {
        Self::SUPPORTED
            .iter()
            .map(|f| f.extension())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Match a MIME type, ignoring parameters such as `;codecs=opus`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "audio/webm" | "video/webm" => Some(AudioFormat::Webm),
            "audio/ogg" | "audio/opus" | "application/ogg" => Some(AudioFormat::Ogg),
            "audio/mpeg" | "audio/mp3" | "audio/mpga" => Some(AudioFormat::Mp3),
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" | "video/mp4" => Some(AudioFormat::Mp4),
            "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => Some(AudioFormat::Wav),
            "audio/flac" | "audio/x-flac" => Some(AudioFormat::Flac),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "webm" => Some(AudioFormat::Webm),
            "ogg" | "oga" | "opus" => Some(AudioFormat::Ogg),
            "mp3" | "mpeg" | "mpga" => Some(AudioFormat::Mp3),
            "mp4" | "m4a" => Some(AudioFormat::Mp4),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            _ => None,
        }
    }

    /// Work out the format of an upload.
    ///
    /// The declared content type wins. When it is absent or the generic
    /// `application/octet-stream`, the file name's extension decides.
    pub fn infer(content_type: Option<&str>, file_name: Option<&str>) -> Result<Self, SpeechError> {
        let declared = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .filter(|ct| !ct.to_ascii_lowercase().starts_with("application/octet-stream"));

        if let Some(ct) = declared {
            return Self::from_mime(ct).ok_or_else(|| SpeechError::UnsupportedFormat(ct.to_string()));
        }

        let ext = file_name.and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext));
        match ext {
            Some(ext) => Self::from_extension(ext)
                .ok_or_else(|| SpeechError::UnsupportedFormat(format!(".{}", ext))),
            None => Err(SpeechError::UnsupportedFormat(
                content_type.unwrap_or("unknown").to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_from_content_type_with_codecs() {
        let f = AudioFormat::infer(Some("audio/webm;codecs=opus"), Some("clip.bin")).unwrap();
        assert_eq!(f, AudioFormat::Webm);
    }

    #[test]
    fn test_infer_falls_back_to_extension() {
        assert_eq!(
            AudioFormat::infer(Some("application/octet-stream"), Some("memo.M4A")).unwrap(),
            AudioFormat::Mp4
        );
        assert_eq!(AudioFormat::infer(None, Some("take.flac")).unwrap(), AudioFormat::Flac);
    }

    #[test]
    fn test_infer_rejects_unknown_mime() {
        let err = AudioFormat::infer(Some("text/plain"), Some("voice.wav")).unwrap_err();
        assert!(matches!(err, SpeechError::UnsupportedFormat(ref m) if m == "text/plain"));
    }

    #[test]
    fn test_infer_rejects_unknown_extension_and_missing_name() {
        assert!(AudioFormat::infer(None, Some("voice.aiff")).is_err());
        assert!(AudioFormat::infer(Some("application/octet-stream"), None).is_err());
        assert!(AudioFormat::infer(None, None).is_err());
    }

    #[test]
    fn test_every_supported_format_round_trips_its_mime() {
        for f in AudioFormat::SUPPORTED {
            assert_eq!(AudioFormat::from_mime(f.mime()), Some(f));
            assert_eq!(AudioFormat::from_extension(f.extension()), Some(f));
        }
    }

    #[test]
    fn test_supported_list() {
        assert_eq!(AudioFormat::supported_list(), "webm, ogg, mp3, m4a, wav, flac");
    }
}
