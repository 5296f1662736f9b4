//! Parlance UI crate - the embedded browser chat page.
//!
//! The page is a single self-contained HTML file with all CSS and JavaScript
//! inline, embedded at compile time via `include_str!`. It records questions
//! with the microphone, streams answers from the chat endpoint, and can read
//! answers aloud.
//!
//! # Usage
//!
//! ```rust,ignore
//! use parlance_ui::CHAT_HTML;
//!
//! async fn ui_handler() -> axum::response::Html<&'static str> {
//!     axum::response::Html(CHAT_HTML)
//! }
//! ```

pub mod chat;

pub use chat::CHAT_HTML;
