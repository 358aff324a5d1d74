//! Heuristic ordering of reconciled candidates
//!
//! No model signal survives reconciliation, so ordering falls back to cheap
//! shape heuristics: complete-looking sentences first, then shorter and
//! well-capitalized ones. Ties keep their arrival order, which preserves
//! the backend's own preference among equally-shaped candidates.

use crate::types::CompletionSuggestion;

const BASE_CONFIDENCE: f32 = 0.5;
const TERMINAL_PUNCTUATION_BONUS: f32 = 0.2;
const SHORT_TEXT_BONUS: f32 = 0.1;
const UPPERCASE_START_BONUS: f32 = 0.05;
const SHORT_TEXT_LIMIT: usize = 140;

/// Scores and orders insertion candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuggestionRanker;

impl SuggestionRanker {
    pub fn new() -> Self {
        Self
    }

    /// Score each candidate, sort best-first, and keep the top
    /// `max_suggestions`. Trailing whitespace is stripped before scoring and
    /// candidates that end up empty are dropped.
    pub fn rank(&self, candidates: &[String], max_suggestions: usize) -> Vec<CompletionSuggestion> {
        let mut suggestions: Vec<CompletionSuggestion> = candidates
            .iter()
            .map(|candidate| candidate.trim_end())
            .filter(|candidate| !candidate.is_empty())
            .map(|candidate| CompletionSuggestion {
                text: candidate.to_string(),
                confidence: score(candidate),
            })
            .collect();

        // Stable sort: equal confidences keep arrival order.
        suggestions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        suggestions.truncate(max_suggestions);
        suggestions
    }
}

fn score(text: &str) -> f32 {
    let mut confidence = BASE_CONFIDENCE;
    if text.ends_with(['.', '!', '?']) {
        confidence += TERMINAL_PUNCTUATION_BONUS;
    }
    if text.chars().count() < SHORT_TEXT_LIMIT {
        confidence += SHORT_TEXT_BONUS;
    }
    if text.chars().next().is_some_and(char::is_uppercase) {
        confidence += UPPERCASE_START_BONUS;
    }
    confidence.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank(candidates: &[&str]) -> Vec<CompletionSuggestion> {
        let owned: Vec<String> = candidates.iter().map(|c| c.to_string()).collect();
        SuggestionRanker::new().rank(&owned, 3)
    }

    #[test]
    fn complete_sentence_outranks_fragment() {
        let ranked = rank(&["Hello there!", "Hi", "Greetings."]);
        assert_eq!(ranked[0].text, "Hello there!");
        assert_eq!(ranked[1].text, "Greetings.");
        assert_eq!(ranked[2].text, "Hi");
    }

    #[test]
    fn short_sentence_scores_085() {
        let ranked = rank(&["Hello there!"]);
        assert!((ranked[0].confidence - 0.85).abs() < f32::EPSILON);
    }

    #[test]
    fn ties_keep_arrival_order() {
        let ranked = rank(&["First one.", "Second one."]);
        assert_eq!(ranked[0].text, "First one.");
        assert_eq!(ranked[1].text, "Second one.");
        assert_eq!(ranked[0].confidence, ranked[1].confidence);
    }

    #[test]
    fn long_text_misses_the_short_bonus() {
        let long = "word ".repeat(30) + "end.";
        assert!(long.chars().count() >= 140);
        let short = "Short.".to_string();
        let ranked = SuggestionRanker::new().rank(&[long.clone(), short], 3);
        assert_eq!(ranked[0].text, "Short.");
        assert!(ranked[1].confidence < ranked[0].confidence);
    }

    #[test]
    fn output_is_capped() {
        let ranked = SuggestionRanker::new().rank(
            &["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()],
            3,
        );
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn trailing_whitespace_is_stripped_before_scoring() {
        let ranked = rank(&["Done.   "]);
        assert_eq!(ranked[0].text, "Done.");
        assert!((ranked[0].confidence - 0.85).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_and_whitespace_candidates_are_dropped() {
        let ranked = rank(&["", "   ", "Keep me"]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].text, "Keep me");
    }

    #[test]
    fn uppercase_start_breaks_otherwise_equal_shapes() {
        let ranked = rank(&["lower case.", "Upper case."]);
        assert_eq!(ranked[0].text, "Upper case.");
    }

    #[test]
    fn confidence_stays_in_unit_range() {
        for candidate in ["A!", "tiny", &"x".repeat(500)] {
            let ranked = rank(&[candidate]);
            let confidence = ranked[0].confidence;
            assert!((0.0..=1.0).contains(&confidence));
        }
    }
}
