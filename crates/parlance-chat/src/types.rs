//! Events and replies produced by the orchestrator.

use serde::Serialize;

/// One event of a streamed chat turn, serialized as the SSE `data` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A fragment of assistant text.
    Content { content: String },
    /// The model asked for a tool; results follow before more content.
    ToolStart { name: String },
    /// The turn failed. Always followed by `Done`.
    Error { error: String },
    /// End of the turn. Always the last event.
    Done,
}

/// Result of a non-streamed chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    pub content: String,
    /// Tool names called during the turn, in call order.
    pub tools_used: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_format() {
        let cases = [
            (
                ChatEvent::Content {
                    content: "Hi".to_string(),
                },
                json!({"type": "content", "content": "Hi"}),
            ),
            (
                ChatEvent::ToolStart {
                    name: "count_records".to_string(),
                },
                json!({"type": "tool_start", "name": "count_records"}),
            ),
            (
                ChatEvent::Error {
                    error: "oops".to_string(),
                },
                json!({"type": "error", "error": "oops"}),
            ),
            (ChatEvent::Done, json!({"type": "done"})),
        ];
        for (event, expected) in cases {
            assert_eq!(serde_json::to_value(&event).unwrap(), expected);
        }
    }
}
