//! Answer normalization for short-answer quiz questions.
//!
//! Students type their answers, so comparison has to be lenient on accents,
//! casing, punctuation and spacing while still telling different words apart.

use unicode_normalization::UnicodeNormalization;

/// Normalize a string for answer comparison.
///
/// Applies the following transformations in order:
/// 1. Lowercase
/// 2. Ligature expansion (`ß` -> `ss`, `æ` -> `ae`, `œ` -> `oe`)
/// 3. Unicode NFD decomposition, then drop combining marks and punctuation
/// 4. Collapse and trim whitespace
///
/// `"Le Cœur"` and `"le coeur"` match; `"chat"` and `"chats"` do not.
pub fn normalize_for_comparison(s: &str) -> String {
    s.to_lowercase()
        .replace('ß', "ss")
        .replace('æ', "ae")
        .replace('œ', "oe")
        .nfd()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a typed answer matches the expected one after normalization.
///
/// An expected answer that normalizes to nothing never matches.
pub fn answers_match(given: &str, expected: &str) -> bool {
    let expected = normalize_for_comparison(expected);
    !expected.is_empty() && normalize_for_comparison(given) == expected
}
