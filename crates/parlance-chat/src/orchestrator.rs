//! Chat orchestrator: drives completions and tool calls for one turn.
//!
//! The browser owns the conversation and resends it every turn. The
//! orchestrator strips client-supplied system messages, prepends its own
//! system prompt, and loops: request a completion, run any requested tools,
//! append their results, and ask again until the model answers in text or
//! the round limit is reached.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;

use parlance_db::QueryTools;
use parlance_llm::{
    ChatMessage, ChatProvider, Completion, CompletionAccumulator, CompletionRequest, Role, ToolCall,
};

use crate::error::ChatError;
use crate::types::{AssistantReply, ChatEvent};

/// Events buffered between the worker task and the HTTP response.
const EVENT_BUFFER: usize = 64;

/// Coordinates the chat provider and the query tools. Cheap to clone.
#[derive(Clone)]
pub struct ChatOrchestrator {
    provider: Arc<dyn ChatProvider>,
    tools: Arc<QueryTools>,
    system_prompt: Arc<str>,
    max_tool_rounds: u32,
}

impl ChatOrchestrator {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        tools: Arc<QueryTools>,
        system_prompt: impl Into<String>,
        max_tool_rounds: u32,
    ) -> Self {
        Self {
            provider,
            tools,
            system_prompt: Arc::from(system_prompt.into()),
            max_tool_rounds: max_tool_rounds.max(1),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Run one turn to completion and return the final assistant text.
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<AssistantReply, ChatError> {
        let mut conversation = self.prepare(messages)?;
        let mut tools_used = Vec::new();

        for round in 0..=self.max_tool_rounds {
            let request = self.request(&conversation, round);
            let completion = self.provider.complete(&request).await?;

            if !self.wants_tools(&completion, round) {
                return Ok(AssistantReply {
                    content: completion.message.text_content().to_string(),
                    tools_used,
                });
            }

            let calls = completion.tool_calls().to_vec();
            conversation.push(completion.message);
            for call in &calls {
                tools_used.push(call.function.name.clone());
                conversation.push(self.run_tool(call).await);
            }
        }

        // The last round is sent without tools, so the loop always returns.
        Ok(AssistantReply {
            content: String::new(),
            tools_used,
        })
    }

    /// Run one turn in a background task, yielding events as they happen.
    ///
    /// The stream always ends with [`ChatEvent::Done`], preceded by a
    /// [`ChatEvent::Error`] when the turn failed. It stops early only if the
    /// receiver is dropped.
    pub fn stream(&self, messages: Vec<ChatMessage>) -> ReceiverStream<ChatEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let this = self.clone();

        tokio::spawn(
            async move {
                match this.run_stream(messages, &tx).await {
                    Ok(()) => {}
                    Err(ChatError::Disconnected) => {
                        tracing::debug!("Client disconnected mid-stream");
                        return;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Chat turn failed");
                        let _ = tx
                            .send(ChatEvent::Error {
                                error: e.user_message(),
                            })
                            .await;
                    }
                }
                let _ = tx.send(ChatEvent::Done).await;
            }
            .in_current_span(),
        );

        ReceiverStream::new(rx)
    }

    async fn run_stream(
        &self,
        messages: Vec<ChatMessage>,
        tx: &mpsc::Sender<ChatEvent>,
    ) -> Result<(), ChatError> {
        let mut conversation = self.prepare(messages)?;

        for round in 0..=self.max_tool_rounds {
            let request = self.request(&conversation, round);
            let mut deltas = self.provider.stream(&request).await?;
            let mut acc = CompletionAccumulator::new();

            while let Some(delta) = deltas.next().await {
                let delta = delta?;
                if let Some(text) = delta.content.as_deref().filter(|t| !t.is_empty()) {
                    emit(
                        tx,
                        ChatEvent::Content {
                            content: text.to_string(),
                        },
                    )
                    .await?;
                }
                acc.push(&delta);
            }

            let completion = acc.finish();
            if !self.wants_tools(&completion, round) {
                return Ok(());
            }

            let calls = completion.tool_calls().to_vec();
            conversation.push(completion.message);
            for call in &calls {
                emit(
                    tx,
                    ChatEvent::ToolStart {
                        name: call.function.name.clone(),
                    },
                )
                .await?;
                conversation.push(self.run_tool(call).await);
            }
        }
        Ok(())
    }

    /// Drop client system messages and put the server prompt first.
    fn prepare(&self, messages: Vec<ChatMessage>) -> Result<Vec<ChatMessage>, ChatError> {
        let dropped = messages.iter().filter(|m| m.role == Role::System).count();
        if dropped > 0 {
            tracing::debug!(dropped, "Ignoring client-supplied system messages");
        }

        let mut conversation = Vec::with_capacity(messages.len() + 1);
        conversation.push(ChatMessage::system(self.system_prompt.as_ref()));
        conversation.extend(messages.into_iter().filter(|m| m.role != Role::System));

        if conversation.len() == 1 {
            return Err(ChatError::EmptyConversation);
        }
        Ok(conversation)
    }

    /// Rounds below the limit declare the tools; the last one does not.
    fn request(&self, conversation: &[ChatMessage], round: u32) -> CompletionRequest {
        let tools = if round < self.max_tool_rounds {
            self.tools.specs()
        } else {
            tracing::warn!(
                rounds = self.max_tool_rounds,
                "Tool round limit reached, requesting a text answer"
            );
            Vec::new()
        };
        CompletionRequest {
            messages: conversation.to_vec(),
            tools,
        }
    }

    fn wants_tools(&self, completion: &Completion, round: u32) -> bool {
        !completion.tool_calls().is_empty() && round < self.max_tool_rounds
    }

    async fn run_tool(&self, call: &ToolCall) -> ChatMessage {
        tracing::info!(tool = %call.function.name, call_id = %call.id, "Running tool");
        let output = self
            .tools
            .dispatch(&call.function.name, &call.function.arguments)
            .await;
        ChatMessage::tool_result(call.id.clone(), output.content)
    }
}

async fn emit(tx: &mpsc::Sender<ChatEvent>, event: ChatEvent) -> Result<(), ChatError> {
    tx.send(event).await.map_err(|_| ChatError::Disconnected)
}
