//! The seam between the chat orchestrator and a hosted model.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::LlmError;
use crate::types::{Completion, CompletionDelta, CompletionRequest};

/// Stream of completion increments, in arrival order.
pub type DeltaStream = BoxStream<'static, Result<CompletionDelta, LlmError>>;

/// A hosted chat-completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Request a complete response as a single JSON body.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError>;

    /// Request a streamed response.
    ///
    /// Errors that happen before the first byte (auth, bad request) come back
    /// as the outer `Err`; failures after that arrive as stream items.
    async fn stream(&self, request: &CompletionRequest) -> Result<DeltaStream, LlmError>;
}
