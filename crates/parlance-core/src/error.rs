use thiserror::Error;

/// Top-level error type for Parlance startup and configuration.
///
/// Service crates (`parlance-llm`, `parlance-db`, `parlance-speech`) keep
/// their own error enums; this one covers what the binary can fail on before
/// the server is accepting requests.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParlanceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for ParlanceError {
    fn from(err: toml::de::Error) -> Self {
        ParlanceError::Config(err.to_string())
    }
}

/// A specialized `Result` type for Parlance operations.
pub type Result<T> = std::result::Result<T, ParlanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParlanceError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = ParlanceError::MissingEnv("CHAT_API_KEY".to_string());
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: CHAT_API_KEY"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ParlanceError = io_err.into();
        assert!(matches!(err, ParlanceError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let err: ParlanceError = toml_err.into();
        assert!(matches!(err, ParlanceError::Config(_)));
    }
}
