use std::collections::HashSet;

use serde::Serialize;
use sha2::{Digest, Sha256};
use sq_wordsearch::{Placement, Puzzle, PuzzleConfig, normalize_word};
use uuid::Uuid;

use crate::error::ApiError;

pub const MIN_WORDS: usize = 2;
pub const MAX_WORDS: usize = 30;
const MAX_WORD_CHARS: usize = 40;

/// Check a word list and return it trimmed, in input order.
///
/// Every word must normalize to at least two letters, fit in the largest
/// grid and be distinct from the others once normalized.
pub fn validate_words(words: &[String], config: &PuzzleConfig) -> Result<Vec<String>, ApiError> {
    let words: Vec<String> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect();

    if !(MIN_WORDS..=MAX_WORDS).contains(&words.len()) {
        return Err(ApiError::Validation(format!(
            "A word search needs between {MIN_WORDS} and {MAX_WORDS} words"
        )));
    }

    let mut seen = HashSet::new();
    for word in &words {
        if word.chars().count() > MAX_WORD_CHARS {
            return Err(ApiError::Validation(format!("'{word}' is too long")));
        }
        let normalized = normalize_word(word).ok_or_else(|| {
            ApiError::Validation(format!("'{word}' must contain at least two letters"))
        })?;
        if normalized.len() > config.max_size {
            return Err(ApiError::Validation(format!(
                "'{word}' is longer than {} letters",
                config.max_size
            )));
        }
        if !seen.insert(normalized) {
            return Err(ApiError::Validation(format!(
                "'{word}' appears more than once"
            )));
        }
    }

    Ok(words)
}

/// Puzzle seed for a redeemed code: the first 8 bytes of SHA-256 over the
/// code id, big-endian. Reloading the page shows the same grid.
pub fn seed_for_code(code_id: Uuid) -> u64 {
    let digest = Sha256::digest(code_id.as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(seed)
}

/// What a student sees: the letters and the words to find.
#[derive(Debug, Clone, Serialize)]
pub struct PuzzleView {
    pub size: usize,
    pub rows: Vec<String>,
    pub words: Vec<String>,
}

impl From<&Puzzle> for PuzzleView {
    fn from(puzzle: &Puzzle) -> Self {
        Self {
            size: puzzle.size(),
            rows: puzzle.rows(),
            words: puzzle.words().into_iter().map(String::from).collect(),
        }
    }
}

/// Back-office preview, with the answer key.
#[derive(Debug, Clone, Serialize)]
pub struct PuzzlePreview {
    pub seed: u64,
    #[serde(flatten)]
    pub view: PuzzleView,
    pub placements: Vec<Placement>,
    pub skipped: Vec<String>,
}

impl PuzzlePreview {
    pub fn new(puzzle: &Puzzle, seed: u64) -> Self {
        Self {
            seed,
            view: PuzzleView::from(puzzle),
            placements: puzzle.placements().to_vec(),
            skipped: puzzle.skipped().to_vec(),
        }
    }
}
