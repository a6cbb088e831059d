//! Word-search puzzle generation for StoryQuest
//!
//! This crate builds square letter grids hiding a list of vocabulary words.
//! Words run in any of the eight straight directions, may cross each other
//! when they share a letter, and the remaining cells are filled with random
//! uppercase letters.
//!
//! Generation is deterministic for a given word list, seed and
//! [`PuzzleConfig`], so a server can hand the same puzzle back to a student
//! and later re-check their selections without storing the grid.
//!
//! # Example
//!
//! ```
//! use sq_wordsearch::{PuzzleConfig, generate};
//!
//! let puzzle = generate(&["lion", "tiger", "zebra"], 42, &PuzzleConfig::default());
//! assert_eq!(puzzle.rows().len(), puzzle.size());
//! for placement in puzzle.placements() {
//!     let found = puzzle.match_selection(placement.end(), placement.start);
//!     assert_eq!(found.map(|p| p.word.as_str()), Some(placement.word.as_str()));
//! }
//! ```

mod generator;
mod geometry;
mod puzzle;

use unicode_normalization::UnicodeNormalization;

pub use generator::generate;
pub use geometry::{Direction, Placement, Position};
pub use puzzle::Puzzle;

/// Shortest word (in letters) the generator accepts.
pub const MIN_WORD_LEN: usize = 2;

/// Tunables for [`generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct PuzzleConfig {
    /// Smallest side length of the grid
    pub min_size: usize,
    /// Largest side length of the grid; longer words are skipped
    pub max_size: usize,
    /// Target share of cells covered by word letters, in `(0, 1]`
    pub fill_ratio: f64,
    /// Number of best-scored placements kept per word
    pub candidate_limit: usize,
    /// Total number of times the generator may undo a placed word
    pub max_backtracks: usize,
    /// Directions words are allowed to run in
    pub directions: Vec<Direction>,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            min_size: 8,
            max_size: 20,
            fill_ratio: 0.5,
            candidate_limit: 200,
            max_backtracks: 64,
            directions: Direction::ALL.to_vec(),
        }
    }
}

/// Normalize a vocabulary word for the grid.
///
/// Accents are stripped, anything that is not an ASCII letter is dropped and
/// the result is uppercased, so `"Café au lait"` becomes `"CAFEAULAIT"`.
/// Returns `None` when fewer than [`MIN_WORD_LEN`] letters remain.
pub fn normalize_word(word: &str) -> Option<String> {
    let normalized: String = word
        .replace('ß', "ss")
        .replace('æ', "ae")
        .replace('œ', "oe")
        .nfd()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    (normalized.len() >= MIN_WORD_LEN).then_some(normalized)
}

/// Side length of the grid for a list of already-normalized words.
///
/// The grid is at least as wide as the longest word, large enough for the
/// letters to cover roughly `fill_ratio` of the cells, and never smaller than
/// `min_size`. The result is capped at `max_size`.
pub fn grid_size<S: AsRef<str>>(words: &[S], config: &PuzzleConfig) -> usize {
    let longest = words.iter().map(|w| w.as_ref().len()).max().unwrap_or(0);
    let letters: usize = words.iter().map(|w| w.as_ref().len()).sum();

    let ratio = if config.fill_ratio > 0.0 && config.fill_ratio <= 1.0 {
        config.fill_ratio
    } else {
        1.0
    };
    let side = (letters as f64 / ratio).sqrt().ceil() as usize;

    longest.max(side).max(config.min_size).min(config.max_size)
}
