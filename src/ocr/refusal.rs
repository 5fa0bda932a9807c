//! Detection of non-answers from LLM providers.
//!
//! Vision models sometimes decline to transcribe ("I'm sorry, I can't help
//! with that"). The check is a case-insensitive substring heuristic: false
//! positives and negatives are accepted.

/// Phrases that mark a response as a refusal (lowercase).
pub const REFUSAL_MARKERS: &[&str] = &[
    "i'm sorry, i can't",
    "i’m sorry, i can’t",
    "i am sorry, i can't",
    "i'm sorry, but i can't",
    "cannot extract text from this image",
    "can't extract text",
    "unable to extract text",
    "as an ai",
];

/// Returns true when `text` is empty or contains any refusal marker.
///
/// Only the zero-length string counts as empty; whitespace-only text is an
/// answer.
pub fn is_refusal(text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    let lowered = text.trim().to_lowercase();
    REFUSAL_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Optional-text variant: a missing response counts as a refusal.
pub fn is_refusal_opt(text: Option<&str>) -> bool {
    text.map(is_refusal).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_missing_are_refusals() {
        assert!(is_refusal(""));
        assert!(is_refusal_opt(None));
        assert!(is_refusal_opt(Some("")));
    }

    #[test]
    fn test_whitespace_only_is_not_a_refusal() {
        assert!(!is_refusal("   \n"));
        assert!(!is_refusal("\t"));
        assert!(!is_refusal_opt(Some(" ")));
    }

    #[test]
    fn test_markers_match_anywhere_in_any_case() {
        for marker in REFUSAL_MARKERS {
            assert!(is_refusal(marker), "{marker}");
            assert!(is_refusal(&marker.to_uppercase()), "{marker}");
            let embedded = format!("Well... {} this one, sorry.", marker);
            assert!(is_refusal(&embedded), "{embedded}");
        }
        assert!(is_refusal("As an AI language model I cannot read handwriting"));
        assert!(is_refusal("  I'M SORRY, I CAN'T do that  "));
    }

    #[test]
    fn test_real_transcriptions_are_accepted() {
        assert!(!is_refusal("Buy milk, eggs and bread"));
        assert!(!is_refusal("Meeting moved to 3pm"));
        assert!(!is_refusal_opt(Some("Dear diary,")));
        // Close to a marker but not containing one.
        assert!(!is_refusal("I can extract text from this image"));
    }
}
