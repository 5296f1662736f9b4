//! Wire-level tests for the transcription and synthesis clients.

use std::time::Duration;

use futures::StreamExt;
use parlance_speech::{
    AudioFormat, SpeechError, SpeechSynthesisClient, Synthesizer, Transcriber, TranscriptionClient,
};
use serde_json::json;
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn transcriber(server: &MockServer) -> TranscriptionClient {
    TranscriptionClient::new(&format!("{}/v1", server.uri()), "sk-stt", "whisper-1", TIMEOUT).unwrap()
}

fn synthesizer(server: &MockServer) -> SpeechSynthesisClient {
    SpeechSynthesisClient::new(&format!("{}/v1", server.uri()), "sk-tts", "tts-1", "alloy", TIMEOUT)
        .unwrap()
}

/// Multipart body with a `file` part named after the format and a `model` part.
fn is_transcription_form(req: &Request) -> bool {
    let multipart = req
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&req.body).to_ascii_lowercase();
    multipart
        && body.contains("name=\"file\"; filename=\"recording.webm\"")
        && body.contains("content-type: audio/webm")
        && body.contains("fake-opus-bytes")
        && body.contains("name=\"model\"")
        && body.contains("whisper-1")
}

#[tokio::test]
async fn test_transcribe_posts_file_and_model_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .and(header("authorization", "Bearer sk-stt"))
        .and(is_transcription_form)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": " How many orders? \n"})))
        .expect(1)
        .mount(&server)
        .await;

    let transcript = transcriber(&server)
        .transcribe(b"fake-opus-bytes".to_vec(), AudioFormat::Webm)
        .await
        .unwrap();
    assert_eq!(transcript, "How many orders?");
}

#[tokio::test]
async fn test_transcribe_error_carries_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Invalid file format.", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = transcriber(&server)
        .transcribe(b"junk".to_vec(), AudioFormat::Wav)
        .await
        .unwrap_err();
    match err {
        SpeechError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid file format.");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_synthesize_streams_audio_bytes() {
    let server = MockServer::start().await;
    let audio: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .and(header("authorization", "Bearer sk-tts"))
        .and(body_json(json!({
            "model": "tts-1",
            "voice": "alloy",
            "input": "Twelve orders are open.",
            "response_format": "mp3"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(audio.clone()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut stream = synthesizer(&server)
        .synthesize("Twelve orders are open.")
        .await
        .unwrap();
    let mut received = Vec::new();
    while let Some(chunk) = stream.next().await {
        received.extend(chunk.unwrap());
    }
    assert_eq!(received, audio);
}

#[tokio::test]
async fn test_synthesize_error_carries_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided"}
        })))
        .mount(&server)
        .await;

    let err = match synthesizer(&server).synthesize("Hello").await {
        Ok(_) => panic!("expected an error"),
        Err(e) => e,
    };
    assert_eq!(err.status(), Some(401));
    assert!(err.to_string().contains("Incorrect API key provided"));
}

#[tokio::test]
async fn test_transcribe_times_out_against_silent_upstream() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let stt = TranscriptionClient::new(
        &format!("http://{}/v1", addr),
        "sk-stt",
        "whisper-1",
        Duration::from_millis(300),
    )
    .unwrap();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        stt.transcribe(b"audio".to_vec(), AudioFormat::Ogg),
    )
    .await
    .expect("transcribe() must give up once the request timeout passes");
    assert!(matches!(result, Err(SpeechError::Network(_))), "{:?}", result);
}
