//! API error types and JSON error response formatting.
//!
//! Every failure leaves the server as `{"error": "<readable>", "code": "<machine>"}`.
//! Upstream provider errors are translated here; their raw bodies are logged,
//! never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use parlance_chat::ChatError;
use parlance_llm::LlmError;
use parlance_speech::SpeechError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message, safe to show in the UI.
    pub error: String,
    /// Machine-readable error code (e.g., "bad_request", "bad_gateway").
    pub code: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid input.
    BadRequest(String),
    /// 413 Payload Too Large.
    PayloadTooLarge(String),
    /// 415 Unsupported Media Type.
    UnsupportedMediaType(String),
    /// 429 Too Many Requests.
    TooManyRequests(String),
    /// 500 Internal Server Error. The detail is logged, not returned.
    Internal(String),
    /// 502 Bad Gateway - an upstream provider failed or rejected us.
    BadGateway(String),
    /// 503 Service Unavailable - an upstream provider is unreachable or busy.
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::UnsupportedMediaType(_) => "unsupported_media_type",
            ApiError::TooManyRequests(_) => "too_many_requests",
            ApiError::Internal(_) => "internal_error",
            ApiError::BadGateway(_) => "bad_gateway",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }

    /// Map a transcription failure. Upstream 400 means the audio itself was bad.
    pub fn transcription(err: SpeechError) -> Self {
        match err.status() {
            Some(400) => {
                tracing::warn!(error = %err, "Transcription provider rejected audio");
                ApiError::BadRequest("could not process audio".to_string())
            }
            _ => Self::speech(err, "transcription"),
        }
    }

    /// Map a synthesis failure.
    pub fn synthesis(err: SpeechError) -> Self {
        Self::speech(err, "speech synthesis")
    }

    fn speech(err: SpeechError, service: &str) -> Self {
        match err {
            SpeechError::UnsupportedFormat(_) => ApiError::UnsupportedMediaType(err.to_string()),
            SpeechError::EmptyAudio | SpeechError::EmptyText | SpeechError::TextTooLong { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            SpeechError::Api { status, message } => {
                upstream(&format!("the {} provider", service), status, &message)
            }
            SpeechError::Network(detail) => {
                tracing::warn!(service, error = %detail, "Speech provider unreachable");
                ApiError::ServiceUnavailable(format!("could not reach the {} provider", service))
            }
            SpeechError::InvalidResponse(detail) => {
                tracing::warn!(service, error = %detail, "Speech provider sent an invalid response");
                ApiError::BadGateway(format!("the {} provider returned an invalid response", service))
            }
        }
    }
}

/// Translate an upstream HTTP failure.
fn upstream(provider: &str, status: u16, message: &str) -> ApiError {
    tracing::warn!(provider, status, error = %message, "Upstream provider error");
    match status {
        401 | 403 => ApiError::BadGateway(format!("authentication with {} failed", provider)),
        413 => ApiError::PayloadTooLarge(format!("request too large for {}", provider)),
        429 => ApiError::ServiceUnavailable(format!("{} is busy, please try again shortly", provider)),
        _ => ApiError::BadGateway(format!("{} returned an error", provider)),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code().to_string();
        let message = match self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                "internal server error".to_string()
            }
            ApiError::BadRequest(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::UnsupportedMediaType(msg)
            | ApiError::TooManyRequests(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        };

        (status, Json(ErrorBody { error: message, code })).into_response()
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Api { status, message } => upstream("the chat provider", status, &message),
            LlmError::Network(detail) => {
                tracing::warn!(error = %detail, "Chat provider unreachable");
                ApiError::ServiceUnavailable("could not reach the chat provider".to_string())
            }
            LlmError::InvalidResponse(detail) | LlmError::Stream(detail) => {
                tracing::warn!(error = %detail, "Chat provider sent an invalid response");
                ApiError::BadGateway("the chat provider returned an invalid response".to_string())
            }
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyConversation => ApiError::BadRequest(err.to_string()),
            ChatError::Provider(e) => e.into(),
            ChatError::Disconnected => ApiError::Internal(err.to_string()),
        }
    }
}
