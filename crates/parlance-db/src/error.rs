//! Error types for database access and query tools.

/// Errors from the hosted database or from tool arguments that cannot be
/// turned into a query.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("unknown table or view: {0}")]
    UnknownTable(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("database unreachable: {0}")]
    Network(String),
    #[error("database returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("invalid database response: {0}")]
    InvalidResponse(String),
}
