//! Reassembles streamed completion deltas into a full [`Completion`].

use std::collections::BTreeMap;

use crate::types::{ChatMessage, Completion, CompletionDelta, ToolCall};

#[derive(Debug, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// Collects text and tool-call fragments from a completion stream.
///
/// Tool-call fragments are keyed by their `index`; the first fragment carries
/// the id and name, later ones append to the argument string.
#[derive(Debug, Default)]
pub struct CompletionAccumulator {
    content: String,
    tool_calls: BTreeMap<u32, PartialToolCall>,
    finish_reason: Option<String>,
}

impl CompletionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, delta: &CompletionDelta) {
        if let Some(ref text) = delta.content {
            self.content.push_str(text);
        }
        for fragment in &delta.tool_calls {
            let entry = self.tool_calls.entry(fragment.index).or_default();
            if let Some(ref id) = fragment.id {
                if !id.is_empty() {
                    entry.id = Some(id.clone());
                }
            }
            if let Some(ref name) = fragment.name {
                entry.name.push_str(name);
            }
            if let Some(ref args) = fragment.arguments {
                entry.arguments.push_str(args);
            }
        }
        if delta.finish_reason.is_some() {
            self.finish_reason = delta.finish_reason.clone();
        }
    }

    /// Text received so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn finish(self) -> Completion {
        let content = if self.content.is_empty() {
            None
        } else {
            Some(self.content)
        };

        let message = if self.tool_calls.is_empty() {
            ChatMessage::assistant(content.unwrap_or_default())
        } else {
            let calls = self
                .tool_calls
                .into_iter()
                .map(|(index, partial)| {
                    let id = partial.id.unwrap_or_else(|| format!("call_{}", index));
                    let arguments = if partial.arguments.trim().is_empty() {
                        "{}".to_string()
                    } else {
                        partial.arguments
                    };
                    ToolCall::new(id, partial.name, arguments)
                })
                .collect();
            ChatMessage::assistant_tool_calls(content, calls)
        };

        Completion {
            message,
            finish_reason: self.finish_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, ToolCallDelta};

    fn text(s: &str) -> CompletionDelta {
        CompletionDelta {
            content: Some(s.to_string()),
            ..Default::default()
        }
    }

    fn call_fragment(
        index: u32,
        id: Option<&str>,
        name: Option<&str>,
        args: Option<&str>,
    ) -> CompletionDelta {
        CompletionDelta {
            tool_calls: vec![ToolCallDelta {
                index,
                id: id.map(String::from),
                name: name.map(String::from),
                arguments: args.map(String::from),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_text_only() {
        let mut acc = CompletionAccumulator::new();
        acc.push(&text("Hel"));
        acc.push(&text("lo"));
        acc.push(&CompletionDelta {
            finish_reason: Some("stop".to_string()),
            ..Default::default()
        });
        assert_eq!(acc.content(), "Hello");

        let completion = acc.finish();
        assert_eq!(completion.message.role, Role::Assistant);
        assert_eq!(completion.message.content.as_deref(), Some("Hello"));
        assert!(completion.tool_calls().is_empty());
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_empty_stream_yields_empty_text() {
        let completion = CompletionAccumulator::new().finish();
        assert_eq!(completion.message.content.as_deref(), Some(""));
        assert!(completion.message.tool_calls.is_none());
    }

    #[test]
    fn test_fragmented_tool_call_arguments() {
        let mut acc = CompletionAccumulator::new();
        acc.push(&call_fragment(0, Some("call_a"), Some("count_records"), Some("")));
        acc.push(&call_fragment(0, None, None, Some("{\"table\":")));
        acc.push(&call_fragment(0, None, None, Some("\"orders\"}")));

        let completion = acc.finish();
        let calls = completion.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_a");
        assert_eq!(calls[0].function.name, "count_records");
        assert_eq!(calls[0].function.arguments, "{\"table\":\"orders\"}");
        assert!(completion.message.content.is_none());
    }

    #[test]
    fn test_parallel_tool_calls_ordered_by_index() {
        let mut acc = CompletionAccumulator::new();
        acc.push(&call_fragment(1, Some("call_b"), Some("search_records"), Some("{}")));
        acc.push(&call_fragment(0, Some("call_a"), Some("count_records"), Some("{}")));

        let completion = acc.finish();
        let names: Vec<&str> = completion
            .tool_calls()
            .iter()
            .map(|c| c.function.name.as_str())
            .collect();
        assert_eq!(names, vec!["count_records", "search_records"]);
    }

    #[test]
    fn test_missing_id_and_arguments_filled_in() {
        let mut acc = CompletionAccumulator::new();
        acc.push(&call_fragment(2, None, Some("count_records"), None));

        let completion = acc.finish();
        let call = &completion.tool_calls()[0];
        assert_eq!(call.id, "call_2");
        assert_eq!(call.function.arguments, "{}");
    }

    #[test]
    fn test_text_before_tool_call_is_kept() {
        let mut acc = CompletionAccumulator::new();
        acc.push(&text("Let me check."));
        acc.push(&call_fragment(0, Some("c"), Some("count_records"), Some("{}")));

        let completion = acc.finish();
        assert_eq!(completion.message.content.as_deref(), Some("Let me check."));
        assert_eq!(completion.tool_calls().len(), 1);
    }
}
