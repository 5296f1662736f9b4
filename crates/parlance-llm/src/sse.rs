//! Incremental decoder for `text/event-stream` bodies.
//!
//! Network chunks split anywhere, including mid-line and mid-character, so
//! bytes are buffered until a full line is available. Only `data:` fields are
//! kept; `event:`, `id:`, `retry:`, and comment lines are ignored.

/// Turns raw body chunks into complete SSE `data` payloads.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning the payloads of every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            self.handle_line(line, &mut events);
        }

        events
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            self.handle_line(line, &mut events);
        }
        self.dispatch(&mut events);
        events
    }

    fn handle_line(&mut self, line: &str, events: &mut Vec<String>) {
        if line.is_empty() {
            self.dispatch(events);
            return;
        }
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
    }

    fn dispatch(&mut self, events: &mut Vec<String>) {
        if !self.data.is_empty() {
            events.push(self.data.join("\n"));
            self.data.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut dec = SseDecoder::new();
        let events = dec.push(b"data: {\"a\":1}\n\n");
        assert_eq!(events, vec!["{\"a\":1}"]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"data: hel").is_empty());
        assert!(dec.push(b"lo\n").is_empty());
        assert_eq!(dec.push(b"\n"), vec!["hello"]);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let text = "data: caf\u{e9}\n\n".as_bytes();
        let split = text.len() - 3; // inside the two-byte é
        let mut dec = SseDecoder::new();
        assert!(dec.push(&text[..split]).is_empty());
        assert_eq!(dec.push(&text[split..]), vec!["caf\u{e9}"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut dec = SseDecoder::new();
        let events = dec.push(b"data: one\r\n\r\ndata: two\r\n\r\n");
        assert_eq!(events, vec!["one", "two"]);
    }

    #[test]
    fn test_multiline_data_joined() {
        let mut dec = SseDecoder::new();
        let events = dec.push(b"data: first\ndata: second\n\n");
        assert_eq!(events, vec!["first\nsecond"]);
    }

    #[test]
    fn test_ignores_comments_and_other_fields() {
        let mut dec = SseDecoder::new();
        let events = dec.push(b": keep-alive\nevent: message\nid: 7\ndata: x\n\n");
        assert_eq!(events, vec!["x"]);
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"data: [DONE]").is_empty());
        assert_eq!(dec.finish(), vec!["[DONE]"]);
        assert!(dec.finish().is_empty());
    }

    #[test]
    fn test_blank_lines_without_data_emit_nothing() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"\n\n\n").is_empty());
    }
}
