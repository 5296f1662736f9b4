//! Router setup with all routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::compression::predicate::{DefaultPredicate, NotForContentType, Predicate};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use parlance_core::config::ServerConfig;
use parlance_core::ParlanceError;

use crate::handlers;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::state::AppState;

/// Body limit for everything except audio uploads.
pub const GLOBAL_BODY_LIMIT: usize = 1024 * 1024;

/// Room for multipart boundaries and headers around the audio bytes.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let port = state.config.server.port;
    let origins: Vec<HeaderValue> = ["127.0.0.1", "localhost"]
        .iter()
        .filter_map(|host| format!("http://{}:{}", host, port).parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    // Event streams are already excluded by the default predicate.
    let compression = CompressionLayer::new()
        .compress_when(DefaultPredicate::new().and(NotForContentType::new("audio/")));

    let limiter = RateLimiter::new(state.config.server.rate_limit_per_sec);
    let audio_limit = state.config.speech.max_audio_bytes.saturating_add(MULTIPART_OVERHEAD);

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat))
        .route(
            "/stt",
            post(handlers::stt).layer(DefaultBodyLimit::max(audio_limit)),
        )
        .route("/tts", post(handlers::tts))
        .layer(axum::middleware::from_fn(rate_limit_middleware))
        .layer(Extension(limiter));

    Router::new()
        .route("/", get(handlers::ui))
        .route("/health", get(handlers::health))
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(GLOBAL_BODY_LIMIT))
        .layer(compression)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), ParlanceError> {
    let addr = format!("{}:{}", config.host, config.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ParlanceError::Server(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(addr = %addr, "API server listening");
    tracing::info!("Chat UI at http://{}/", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ParlanceError::Server(format!("Server error: {}", e)))?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
