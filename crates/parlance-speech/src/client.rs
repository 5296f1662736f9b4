//! HTTP clients for OpenAI-compatible speech endpoints.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use parlance_core::config::SpeechConfig;

use crate::error::SpeechError;
use crate::format::AudioFormat;
use crate::{AudioStream, Synthesizer, Transcriber};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn http_client(timeout: Duration) -> Result<reqwest::Client, SpeechError> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .build()
        .map_err(|e| SpeechError::Network(format!("failed to build HTTP client: {}", e)))
}

/// Posts recordings to `{base}/audio/transcriptions`.
pub struct TranscriptionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl TranscriptionClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SpeechError> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: format!("{}/audio/transcriptions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &SpeechConfig, api_key: impl Into<String>) -> Result<Self, SpeechError> {
        Self::new(
            &config.stt_base_url,
            api_key,
            config.stt_model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl Transcriber for TranscriptionClient {
    async fn transcribe(&self, audio: Vec<u8>, format: AudioFormat) -> Result<String, SpeechError> {
        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        let size = audio.len();
        let part = Part::bytes(audio)
            .file_name(format!("recording.{}", format.extension()))
            .mime_str(format.mime())
            .map_err(|e| SpeechError::InvalidResponse(e.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        tracing::debug!(bytes = size, mime = format.mime(), "Sending audio for transcription");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;
        let response = check(response).await?;

        let body: TranscriptionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                SpeechError::Network(e.to_string())
            } else {
                SpeechError::InvalidResponse(e.to_string())
            }
        })?;
        Ok(body.text.trim().to_string())
    }
}

/// Posts text to `{base}/audio/speech` and streams back MP3 audio.
pub struct SpeechSynthesisClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    voice: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'static str,
}

impl SpeechSynthesisClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        voice: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SpeechError> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: format!("{}/audio/speech", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            voice: voice.into(),
        })
    }

    pub fn from_config(config: &SpeechConfig, api_key: impl Into<String>) -> Result<Self, SpeechError> {
        Self::new(
            &config.tts_base_url,
            api_key,
            config.tts_model.clone(),
            config.tts_voice.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, text: &'a str) -> SpeechRequest<'a> {
        SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: text,
            response_format: "mp3",
        }
    }
}

#[async_trait]
impl Synthesizer for SpeechSynthesisClient {
    async fn synthesize(&self, text: &str) -> Result<AudioStream, SpeechError> {
        tracing::debug!(chars = text.chars().count(), voice = %self.voice, "Requesting speech synthesis");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;
        let response = check(response).await?;

        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| SpeechError::Network(e.to_string()))
        });
        Ok(stream.boxed())
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, SpeechError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status, "Speech provider returned an error");
    Err(SpeechError::Api {
        status,
        message: error_message(&body),
    })
}

/// Pull `error.message` out of an OpenAI-style error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.chars().take(500).collect())
}
