//! Shared configuration and error types for the Parlance workspace.

pub mod config;
pub mod error;

pub use config::{is_identifier, ParlanceConfig, Secrets, TableKind, TableSpec};
pub use error::{ParlanceError, Result};
