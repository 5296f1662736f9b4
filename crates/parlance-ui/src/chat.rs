//! Chat page embedding.

/// The complete self-contained chat page, served at `/`.
///
/// Talks to `/api/chat` (consuming the event stream with a fetch reader),
/// `/api/stt` (multipart `audio` field from a MediaRecorder blob), and
/// `/api/tts` (plays the returned audio). Conversation history is kept in
/// the page and resent with every turn.
pub const CHAT_HTML: &str = include_str!("../assets/chat.html");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_html_is_valid_html() {
        assert!(CHAT_HTML.starts_with("<!DOCTYPE html>"));
        assert!(CHAT_HTML.contains("<html"));
        assert!(CHAT_HTML.contains("</html>"));
    }

    #[test]
    fn chat_html_is_self_contained() {
        assert!(CHAT_HTML.contains("<style>"));
        assert!(CHAT_HTML.contains("<script>"));
        assert!(!CHAT_HTML.contains("https://cdn"));
        assert!(!CHAT_HTML.contains("https://unpkg"));
        assert!(!CHAT_HTML.contains("https://fonts.googleapis"));
    }

    #[test]
    fn chat_html_references_api_endpoints() {
        assert!(CHAT_HTML.contains("'/api/chat'"));
        assert!(CHAT_HTML.contains("'/api/stt'"));
        assert!(CHAT_HTML.contains("'/api/tts'"));
    }

    #[test]
    fn chat_html_records_and_streams() {
        assert!(CHAT_HTML.contains("MediaRecorder"));
        assert!(CHAT_HTML.contains("form.append('audio'"));
        assert!(CHAT_HTML.contains("text/event-stream"));
        assert!(CHAT_HTML.contains("event.type === 'done'"));
    }

    #[test]
    fn chat_html_uses_theme_colors() {
        assert!(CHAT_HTML.contains("#0f1117"));
        assert!(CHAT_HTML.contains("#1a1b2e"));
        assert!(CHAT_HTML.contains("#3b82f6"));
    }

    #[test]
    fn chat_html_has_accessibility_features() {
        assert!(CHAT_HTML.contains("aria-label"));
        assert!(CHAT_HTML.contains("role=\"log\""));
        assert!(CHAT_HTML.contains("skip-link"));
        assert!(CHAT_HTML.contains("prefers-reduced-motion"));
    }
}
