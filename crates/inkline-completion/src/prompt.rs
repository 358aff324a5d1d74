//! Prompt assembly for insertion-style completion
//!
//! The model is asked to produce text to insert at the caret, given the
//! text on either side of it. The assembled prompt also carries the
//! session scope so the engine can route it to the right warm session.

use inkline_sessions::derive_session_scope;

use crate::types::CompletionRequest;

/// Rough chars-per-token factor used to budget context text
const CHARS_PER_TOKEN: usize = 4;

/// A prompt ready to send, plus the scope of the session it should use
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub text: String,
    pub session_scope: String,
}

/// Turns a completion request into backend prompt text.
///
/// A seam for experimentation; the engine only depends on this trait.
pub trait PromptAssembler: Send + Sync {
    fn assemble(&self, request: &CompletionRequest, max_tokens: u32) -> AssembledPrompt;
}

/// Default assembler: frames the field as Before/After sections around the
/// caret and asks for the insertion.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertionPromptBuilder;

impl InsertionPromptBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl PromptAssembler for InsertionPromptBuilder {
    fn assemble(&self, request: &CompletionRequest, max_tokens: u32) -> AssembledPrompt {
        let budget = max_tokens as usize * CHARS_PER_TOKEN;
        let before = truncate_leading(request.text_before_cursor(), budget);
        let after = truncate_trailing(request.text_after_cursor(), budget);

        let mut text = String::new();
        text.push_str("Continue the text naturally at the insertion point.\n");
        text.push_str("Rules:\n");
        text.push_str("- Produce only the text to insert, nothing else.\n");
        text.push_str("- Do not repeat text that is already before or after the insertion point.\n");
        text.push_str("- Match the language, tone, and formatting of the surrounding text.\n");

        if let Some(context) = request.context_text.as_deref().filter(|c| !c.trim().is_empty()) {
            text.push_str("Context: ");
            text.push_str(truncate_trailing(context, budget));
            text.push('\n');
        }

        text.push_str("Before: ");
        text.push_str(before);
        text.push('\n');
        text.push_str("After: ");
        text.push_str(after);
        text.push('\n');
        text.push_str("Insertion:");

        AssembledPrompt {
            text,
            session_scope: derive_session_scope(
                request.context_metadata.url.as_deref(),
                request.context_metadata.page_title.as_deref(),
            ),
        }
    }
}

/// Keep the last `budget` characters; the text nearest the caret matters most.
fn truncate_leading(text: &str, budget: usize) -> &str {
    let excess = text.chars().count().saturating_sub(budget);
    if excess == 0 {
        return text;
    }
    match text.char_indices().nth(excess) {
        Some((index, _)) => &text[index..],
        None => "",
    }
}

/// Keep the first `budget` characters
fn truncate_trailing(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContextMetadata;

    #[test]
    fn prompt_splits_text_around_the_caret() {
        let request = CompletionRequest::new("Hello wor after", 9);
        let assembled = InsertionPromptBuilder::new().assemble(&request, 256);
        assert!(assembled.text.contains("Before: Hello wor\n"));
        assert!(assembled.text.contains("After:  after\n"));
        assert!(assembled.text.ends_with("Insertion:"));
    }

    #[test]
    fn context_text_is_included_when_present() {
        let mut request = CompletionRequest::new("draft", 5);
        request.context_text = Some("Re: quarterly report".to_string());
        let assembled = InsertionPromptBuilder::new().assemble(&request, 256);
        assert!(assembled.text.contains("Context: Re: quarterly report\n"));
    }

    #[test]
    fn blank_context_text_is_omitted() {
        let mut request = CompletionRequest::new("draft", 5);
        request.context_text = Some("   ".to_string());
        let assembled = InsertionPromptBuilder::new().assemble(&request, 256);
        assert!(!assembled.text.contains("Context:"));
    }

    #[test]
    fn long_prefix_keeps_the_text_nearest_the_caret() {
        let long = "a".repeat(5000) + "near the caret";
        let caret = long.chars().count();
        let request = CompletionRequest::new(long, caret);
        let assembled = InsertionPromptBuilder::new().assemble(&request, 256);
        assert!(assembled.text.contains("near the caret"));
        // 256 tokens * 4 chars leaves no room for the full 5000-char run.
        assert!(!assembled.text.contains(&"a".repeat(2000)));
    }

    #[test]
    fn scope_follows_the_page_url() {
        let mut request = CompletionRequest::new("text", 4);
        request.context_metadata = ContextMetadata {
            url: Some("https://mail.example.com/compose?draft=1".to_string()),
            ..ContextMetadata::default()
        };
        let assembled = InsertionPromptBuilder::new().assemble(&request, 256);
        assert_eq!(
            assembled.session_scope,
            derive_session_scope(Some("https://mail.example.com/compose"), None)
        );
    }

    #[test]
    fn missing_page_identity_scopes_globally() {
        let request = CompletionRequest::new("text", 4);
        let assembled = InsertionPromptBuilder::new().assemble(&request, 256);
        assert_eq!(assembled.session_scope, derive_session_scope(None, None));
    }
}
