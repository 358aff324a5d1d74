//! Overlap reconciliation between suggestions and surrounding text
//!
//! A model often restates text that is already in the field. Inserting such
//! a suggestion verbatim would duplicate content, so each candidate is
//! trimmed of its longest overlap with the text immediately before the
//! caret, and then against the text that follows it. Matching is greedy
//! from the maximum possible overlap length down to one character; the
//! first (longest) match wins and there is no backtracking.
//!
//! All comparisons are character-based so multibyte text trims cleanly.

/// Trim `suggestion` of spans duplicating the caret `prefix` and, when
/// non-empty, the caret `suffix`.
pub fn trim_suggestion_overlap(prefix: &str, suggestion: &str, suffix: &str) -> String {
    if suggestion.is_empty() {
        return String::new();
    }

    let mut rest = &suggestion[prefix_overlap_bytes(prefix, suggestion)..];
    if rest.is_empty() || suffix.is_empty() {
        return rest.to_string();
    }

    rest = &rest[head_overlap_bytes(rest, suffix)..];
    if rest.is_empty() {
        return String::new();
    }

    let keep = rest.len() - tail_overlap_bytes(rest, suffix);
    rest[..keep].to_string()
}

/// Reconcile every candidate, strip trailing whitespace, and drop entries
/// that end up empty.
///
/// If trimming would empty the entire list, the sanitized originals are
/// returned instead: losing all suggestions is worse than showing one with
/// a minor duplication.
pub fn trim_suggestions(prefix: &str, suggestions: &[String], suffix: &str) -> Vec<String> {
    let trimmed: Vec<String> = suggestions
        .iter()
        .map(|suggestion| trim_suggestion_overlap(prefix, suggestion, suffix))
        .map(|suggestion| sanitize_suggestion_text(&suggestion).to_string())
        .filter(|suggestion| !suggestion.is_empty())
        .collect();
    if !trimmed.is_empty() {
        return trimmed;
    }
    suggestions
        .iter()
        .map(|suggestion| sanitize_suggestion_text(suggestion).to_string())
        .filter(|suggestion| !suggestion.is_empty())
        .collect()
}

/// Strip trailing whitespace (including non-breaking spaces); a candidate
/// that is whitespace-only becomes empty. Leading whitespace is preserved,
/// since it can be necessary for a natural insertion.
pub fn sanitize_suggestion_text(text: &str) -> &str {
    let without_trailing = text.trim_end();
    if without_trailing.trim().is_empty() {
        return "";
    }
    without_trailing
}

/// Bytes to drop from the front of `candidate` where it repeats the end of
/// `prefix`
fn prefix_overlap_bytes(prefix: &str, candidate: &str) -> usize {
    let limit = char_count(prefix).min(char_count(candidate));
    for overlap in (1..=limit).rev() {
        let prefix_tail = &prefix[tail_start(prefix, overlap)..];
        let candidate_head = &candidate[..head_end(candidate, overlap)];
        if prefix_tail == candidate_head {
            return candidate_head.len();
        }
    }
    0
}

/// Bytes to drop from the front of `candidate` where it repeats the start
/// of `suffix`
fn head_overlap_bytes(candidate: &str, suffix: &str) -> usize {
    let limit = char_count(candidate).min(char_count(suffix));
    for overlap in (1..=limit).rev() {
        let candidate_head = &candidate[..head_end(candidate, overlap)];
        let suffix_head = &suffix[..head_end(suffix, overlap)];
        if candidate_head == suffix_head {
            return candidate_head.len();
        }
    }
    0
}

/// Bytes to drop from the end of `candidate` where it runs into the start
/// of `suffix`
fn tail_overlap_bytes(candidate: &str, suffix: &str) -> usize {
    let limit = char_count(candidate).min(char_count(suffix));
    for overlap in (1..=limit).rev() {
        let candidate_tail = &candidate[tail_start(candidate, overlap)..];
        let suffix_head = &suffix[..head_end(suffix, overlap)];
        if candidate_tail == suffix_head {
            return candidate_tail.len();
        }
    }
    0
}

fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Byte index just past the first `chars` characters
fn head_end(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// Byte index where the last `chars` characters begin
fn tail_start(text: &str, chars: usize) -> usize {
    if chars == 0 {
        return text.len();
    }
    text.char_indices()
        .rev()
        .nth(chars - 1)
        .map(|(index, _)| index)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_longest_prefix_overlap() {
        assert_eq!(trim_suggestion_overlap("We will ", "will see", ""), "see");
    }

    #[test]
    fn multibyte_prefix_overlap_is_removed() {
        let trimmed = trim_suggestion_overlap("次に実行結果を見て", "実行結果を見てみます", "");
        assert_eq!(trimmed, "みます");
    }

    #[test]
    fn fully_duplicated_candidate_becomes_empty() {
        let trimmed =
            trim_suggestion_overlap("We will ", "test this soon", "test this soon after launch");
        assert_eq!(trimmed, "");
    }

    #[test]
    fn candidate_running_into_suffix_is_clipped() {
        // "soon, and" ends with text the suffix begins with.
        let trimmed = trim_suggestion_overlap("See you ", "soon, and", ", and then some");
        assert_eq!(trimmed, "soon");
    }

    #[test]
    fn no_overlap_leaves_the_candidate_alone() {
        assert_eq!(
            trim_suggestion_overlap("Dear ", "regards to everyone", "yours"),
            "regards to everyone"
        );
    }

    #[test]
    fn empty_candidate_stays_empty() {
        assert_eq!(trim_suggestion_overlap("abc", "", "def"), "");
    }

    #[test]
    fn longest_match_wins_over_shorter_ones() {
        // Both "aba" (3) and "a" (1) match; the longest is taken.
        assert_eq!(trim_suggestion_overlap("xaba", "abab", ""), "b");
    }

    #[test]
    fn reconciliation_is_stable_on_realistic_text() {
        let prefix = "次に実行結果を見て";
        let once = trim_suggestion_overlap(prefix, "実行結果を見てみます", "");
        let twice = trim_suggestion_overlap(prefix, &once, "");
        assert_eq!(once, twice);

        let prefix = "The meeting is ";
        let once = trim_suggestion_overlap(prefix, "is scheduled for Monday.", "");
        let twice = trim_suggestion_overlap(prefix, &once, "");
        assert_eq!(once, twice);
    }

    #[test]
    fn batch_trimming_drops_emptied_candidates() {
        let suggestions = vec!["world".to_string(), "brand new text".to_string()];
        let trimmed = trim_suggestions("hello world", &suggestions, "");
        assert_eq!(trimmed, vec!["brand new text".to_string()]);
    }

    #[test]
    fn batch_trimming_keeps_partially_trimmed_candidates() {
        // Only the overlapping "world" is removed; the remainder survives.
        let suggestions = vec!["world, hello".to_string()];
        let trimmed = trim_suggestions("hello world", &suggestions, "");
        assert_eq!(trimmed, vec![", hello".to_string()]);
    }

    #[test]
    fn batch_trimming_falls_back_when_everything_empties() {
        let suggestions = vec!["test this soon".to_string()];
        let trimmed = trim_suggestions("We will ", &suggestions, "test this soon after launch");
        assert_eq!(trimmed, vec!["test this soon".to_string()]);
    }

    #[test]
    fn whitespace_only_candidates_never_survive() {
        let suggestions = vec!["   ".to_string(), "\u{a0}\u{a0}".to_string()];
        let trimmed = trim_suggestions("prefix", &suggestions, "");
        assert!(trimmed.is_empty());
    }

    #[test]
    fn sanitize_strips_trailing_but_keeps_leading_whitespace() {
        assert_eq!(sanitize_suggestion_text(" hello \u{a0} "), " hello");
        assert_eq!(sanitize_suggestion_text("\t \u{a0}"), "");
        assert_eq!(sanitize_suggestion_text(""), "");
    }
}
