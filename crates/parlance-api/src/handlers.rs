//! Route handler functions for all API endpoints.

use std::convert::Infallible;
use std::time::Duration;

use axum::body::Body;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tracing::Instrument;
use uuid::Uuid;

use parlance_chat::ChatEvent;
use parlance_llm::ChatMessage;
use parlance_speech::{validate_tts_text, AudioFormat};

use crate::error::ApiError;
use crate::state::AppState;

/// Multipart field carrying the recording.
pub const AUDIO_FIELD: &str = "audio";

// =============================================================================
// Request / response types
// =============================================================================

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
    /// Ask for an event stream instead of a single JSON reply.
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SttResponse {
    pub transcript: String,
}

/// Body of `POST /api/tts`.
#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Chat
// =============================================================================

/// POST /api/chat - one conversational turn, as JSON or as server-sent events.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let messages = request
        .messages
        .ok_or_else(|| ApiError::BadRequest("'messages' is required".to_string()))?;
    if messages.is_empty() {
        return Err(ApiError::BadRequest("'messages' must not be empty".to_string()));
    }

    let streaming = request.stream || accepts_event_stream(&headers);
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "chat",
        %request_id,
        streaming,
        messages = messages.len()
    );

    if streaming {
        let events = span.in_scope(|| {
            tracing::info!("Chat turn started");
            state.orchestrator.stream(messages)
        });
        let stream = events.map(|event| Ok::<_, Infallible>(sse_event(&event)));
        return Ok(Sse::new(stream)
            .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
            .into_response());
    }

    let reply = async {
        tracing::info!("Chat turn started");
        let reply = state.orchestrator.complete(messages).await?;
        tracing::info!(tools = ?reply.tools_used, chars = reply.content.len(), "Chat turn finished");
        Ok::<_, ApiError>(reply)
    }
    .instrument(span)
    .await?;

    Ok(Json(ChatResponse {
        message: ChatMessage::assistant(reply.content),
    })
    .into_response())
}

fn accepts_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("text/event-stream"))
}

fn sse_event(event: &ChatEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_default();
    Event::default().data(data)
}

// =============================================================================
// Speech
// =============================================================================

/// POST /api/stt - transcribe the multipart `audio` field.
pub async fn stt(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SttResponse>, ApiError> {
    let max_bytes = state.config.speech.max_audio_bytes;
    let mut multipart =
        multipart.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?;
        upload = Some((content_type, file_name, bytes));
        break;
    }

    let (content_type, file_name, bytes) = upload.ok_or_else(|| {
        ApiError::BadRequest(format!("multipart field '{}' is required", AUDIO_FIELD))
    })?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("audio is empty".to_string()));
    }
    let format = AudioFormat::infer(content_type.as_deref(), file_name.as_deref())
        .map_err(ApiError::transcription)?;
    if bytes.len() > max_bytes {
        return Err(too_large(max_bytes));
    }

    tracing::info!(bytes = bytes.len(), mime = format.mime(), "Transcribing upload");
    let transcript = state
        .transcriber
        .transcribe(bytes.to_vec(), format)
        .await
        .map_err(ApiError::transcription)?;

    Ok(Json(SttResponse { transcript }))
}

fn multipart_error(err: MultipartError, max_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_bytes)
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

fn too_large(max_bytes: usize) -> ApiError {
    ApiError::PayloadTooLarge(format!("audio exceeds the {} byte limit", max_bytes))
}

/// POST /api/tts - synthesize speech and stream the audio back.
pub async fn tts(
    State(state): State<AppState>,
    body: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let text = validate_tts_text(&request.text, state.config.speech.max_tts_chars)
        .map_err(ApiError::synthesis)?;

    tracing::info!(chars = text.chars().count(), "Synthesizing speech");
    let audio = state
        .synthesizer
        .synthesize(text)
        .await
        .map_err(ApiError::synthesis)?;

    Ok((
        [
            (header::CONTENT_TYPE, state.synthesizer.content_type()),
            (header::CACHE_CONTROL, "no-store"),
        ],
        Body::from_stream(audio),
    )
        .into_response())
}

// =============================================================================
// Health and UI
// =============================================================================

/// GET /health - liveness and uptime.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET / - serve the self-contained chat page.
pub async fn ui() -> impl IntoResponse {
    Html(parlance_ui::CHAT_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_accepts_event_stream() {
        let mut headers = HeaderMap::new();
        assert!(!accepts_event_stream(&headers));
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream, application/json;q=0.5"),
        );
        assert!(accepts_event_stream(&headers));
    }

    #[test]
    fn test_chat_request_defaults() {
        let req: ChatRequest = serde_json::from_str("{}").unwrap();
        assert!(req.messages.is_none());
        assert!(!req.stream);
    }

    #[test]
    fn test_chat_request_rejects_unknown_role() {
        let parsed = serde_json::from_str::<ChatRequest>(
            r#"{"messages":[{"role":"wizard","content":"hi"}]}"#,
        );
        assert!(parsed.is_err());
    }
}
