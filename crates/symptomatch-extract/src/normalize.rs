//! Text normalization shared by input text and vocabulary phrases.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// Lower-case, turn every run of non-alphanumeric characters into a single
/// space, and pad with one space on each side.
///
/// The padding lets callers test token boundaries with plain substring
/// search (`" sore throat "`) without special-casing the ends of the text.
pub fn normalize_text(text: &str) -> String {
    let lower = text.to_lowercase();
    let collapsed = NON_WORD.replace_all(&lower, " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    format!(" {} ", trimmed)
}

/// Normalize a vocabulary phrase: same rules as input text, without padding.
pub fn normalize_phrase(phrase: &str) -> String {
    normalize_text(phrase).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_punctuation_and_case() {
        assert_eq!(
            normalize_text("Severe HEADACHE, and   dizziness!!"),
            " severe headache and dizziness "
        );
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("  ?!.. "), "");
    }

    #[test]
    fn test_normalize_phrase() {
        assert_eq!(normalize_phrase("Shortness-of-Breath"), "shortness of breath");
    }
}
