//! Request and suggestion data model

use serde::{Deserialize, Serialize};

/// Page context accompanying a completion request.
///
/// Opaque to the core beyond fingerprinting and scope derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMetadata {
    pub domain: Option<String>,
    pub language: Option<String>,
    pub page_title: Option<String>,
    pub url: Option<String>,
}

/// One user trigger event: the full field content, the caret, and where it
/// happened. Immutable once built; owned by the orchestration call that
/// serves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Full text of the field being edited
    pub input_text: String,
    /// Caret offset into `input_text`, counted in characters
    pub cursor_position: usize,
    pub context_metadata: ContextMetadata,
    /// Nearby page text, when the caller captured any
    pub context_text: Option<String>,
}

impl CompletionRequest {
    pub fn new(input_text: impl Into<String>, cursor_position: usize) -> Self {
        Self {
            input_text: input_text.into(),
            cursor_position,
            context_metadata: ContextMetadata::default(),
            context_text: None,
        }
    }

    /// Deterministic cache key: two requests with equal fingerprints are
    /// interchangeable for caching even if other metadata differs.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}::{}::{}::{}",
            self.context_metadata.domain.as_deref().unwrap_or("general"),
            self.context_metadata.language.as_deref().unwrap_or("en"),
            self.input_text,
            self.cursor_position,
        )
    }

    /// Text before the caret
    pub fn text_before_cursor(&self) -> &str {
        &self.input_text[..self.cursor_byte_offset()]
    }

    /// Text after the caret
    pub fn text_after_cursor(&self) -> &str {
        &self.input_text[self.cursor_byte_offset()..]
    }

    fn cursor_byte_offset(&self) -> usize {
        self.input_text
            .char_indices()
            .nth(self.cursor_position)
            .map(|(index, _)| index)
            .unwrap_or(self.input_text.len())
    }
}

/// A ranked insertion candidate. Produced only by the ranker and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSuggestion {
    pub text: String,
    /// Heuristic confidence in `[0, 1]`
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_defaults_domain_and_language() {
        let request = CompletionRequest::new("hello", 5);
        assert_eq!(request.fingerprint(), "general::en::hello::5");
    }

    #[test]
    fn fingerprint_ignores_title_and_url() {
        let mut a = CompletionRequest::new("hello", 5);
        let mut b = a.clone();
        a.context_metadata.page_title = Some("Draft".to_string());
        b.context_metadata.url = Some("https://example.com".to_string());
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn caret_split_respects_multibyte_text() {
        let request = CompletionRequest::new("日本語テキスト", 3);
        assert_eq!(request.text_before_cursor(), "日本語");
        assert_eq!(request.text_after_cursor(), "テキスト");
    }

    #[test]
    fn caret_past_end_clamps_to_text_length() {
        let request = CompletionRequest::new("short", 99);
        assert_eq!(request.text_before_cursor(), "short");
        assert_eq!(request.text_after_cursor(), "");
    }
}
