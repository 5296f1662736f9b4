//! Client for hosted, OpenAI-compatible chat-completion APIs.
//!
//! Provides the message and tool wire types, a [`ChatProvider`] trait with
//! JSON and streaming completions, the SSE frame decoder used to read
//! provider streams, and the accumulator that reassembles streamed deltas
//! (including fragmented tool-call arguments) into a full completion.

pub mod accumulate;
pub mod error;
pub mod openai;
pub mod provider;
pub mod sse;
pub mod types;

pub use accumulate::CompletionAccumulator;
pub use error::LlmError;
pub use openai::{OpenAiClient, OpenAiClientBuilder};
pub use provider::{ChatProvider, DeltaStream};
pub use sse::SseDecoder;
pub use types::{
    ChatMessage, Completion, CompletionDelta, CompletionRequest, FunctionCall, Role, ToolCall,
    ToolCallDelta, ToolSpec,
};
