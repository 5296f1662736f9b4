//! Parlance API crate - axum HTTP server, route handlers, SSE streaming.
//!
//! Serves the browser UI, the chat endpoint (JSON or server-sent events),
//! speech-to-text and text-to-speech passthroughs, and a health check.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
