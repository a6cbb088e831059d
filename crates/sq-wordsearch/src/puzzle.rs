use serde::Serialize;

use crate::{Placement, Position};

/// A generated word-search grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Puzzle {
    size: usize,
    cells: Vec<char>,
    placements: Vec<Placement>,
    skipped: Vec<String>,
}

impl Puzzle {
    pub(crate) const fn new(
        size: usize,
        cells: Vec<char>,
        placements: Vec<Placement>,
        skipped: Vec<String>,
    ) -> Self {
        Self {
            size,
            cells,
            placements,
            skipped,
        }
    }

    /// Side length of the square grid.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Words hidden in the grid, in placement order.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Normalized words that could not be placed.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Hidden words, alphabetically, for display next to the grid.
    pub fn words(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.placements.iter().map(|p| p.word.as_str()).collect();
        words.sort_unstable();
        words
    }

    /// Letter at `position`, or `None` outside the grid.
    pub fn letter_at(&self, position: Position) -> Option<char> {
        if !self.contains(position) {
            return None;
        }
        self.cells.get(position.row * self.size + position.col).copied()
    }

    /// Whether `position` lies inside the grid.
    pub const fn contains(&self, position: Position) -> bool {
        position.row < self.size && position.col < self.size
    }

    /// The grid as one string per row.
    pub fn rows(&self) -> Vec<String> {
        if self.size == 0 {
            return Vec::new();
        }
        self.cells
            .chunks(self.size)
            .map(|row| row.iter().collect())
            .collect()
    }

    /// Letters along a straight line from `start` to `end`, inclusive.
    pub fn read_line(&self, start: Position, end: Position) -> Option<String> {
        if !self.contains(start) || !self.contains(end) {
            return None;
        }
        let (direction, len) = start.line_to(end)?;
        (0..len)
            .map(|i| {
                let position = start.step(direction, i, self.size)?;
                self.letter_at(position)
            })
            .collect()
    }

    /// The hidden word a player selected, if any.
    ///
    /// The selection must be a straight line whose two ends are the ends of a
    /// placed word; either end may come first.
    pub fn match_selection(&self, start: Position, end: Position) -> Option<&Placement> {
        if !self.contains(start) || !self.contains(end) {
            return None;
        }
        start.line_to(end)?;
        self.placements.iter().find(|p| p.spans(start, end))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{Direction, PuzzleConfig, generate, grid_size, normalize_word};

    const ANIMALS: &[&str] = &[
        "lion", "tiger", "zebra", "giraffe", "elephant", "monkey", "parrot", "snake", "otter",
        "panda",
    ];

    fn reversed(word: &str) -> String {
        word.chars().rev().collect()
    }

    #[test]
    fn test_grid_dimensions_match_computed_size() {
        let config = PuzzleConfig::default();
        let puzzle = generate(ANIMALS, 1, &config);

        let normalized: Vec<String> = ANIMALS.iter().filter_map(|w| normalize_word(w)).collect();
        assert_eq!(puzzle.size(), grid_size(&normalized, &config));

        let rows = puzzle.rows();
        assert_eq!(rows.len(), puzzle.size());
        assert!(rows.iter().all(|row| row.chars().count() == puzzle.size()));
    }

    #[test]
    fn test_every_placed_word_reads_along_its_line() {
        for seed in 0..25 {
            let puzzle = generate(ANIMALS, seed, &PuzzleConfig::default());
            for placement in puzzle.placements() {
                let forward = puzzle.read_line(placement.start, placement.end());
                assert_eq!(forward.as_deref(), Some(placement.word.as_str()));

                let backward = puzzle.read_line(placement.end(), placement.start);
                assert_eq!(backward, Some(reversed(&placement.word)));
            }
        }
    }

    #[test]
    fn test_intersecting_placements_agree() {
        for seed in 0..25 {
            let puzzle = generate(ANIMALS, seed, &PuzzleConfig::default());
            let mut letters: HashMap<Position, char> = HashMap::new();
            for placement in puzzle.placements() {
                for (position, letter) in placement.cells().zip(placement.word.chars()) {
                    let previous = letters.insert(position, letter);
                    assert!(previous.is_none_or(|p| p == letter), "seed {seed}");
                }
            }
        }
    }

    #[test]
    fn test_cells_are_uppercase_letters() {
        let puzzle = generate(ANIMALS, 99, &PuzzleConfig::default());
        for row in puzzle.rows() {
            assert!(row.chars().all(|c| c.is_ascii_uppercase()), "{row}");
        }
    }

    #[test]
    fn test_all_words_placed_with_default_config() {
        let puzzle = generate(ANIMALS, 5, &PuzzleConfig::default());
        assert!(puzzle.skipped().is_empty(), "{:?}", puzzle.skipped());
        assert_eq!(puzzle.words().len(), ANIMALS.len());
    }

    #[test]
    fn test_same_seed_same_puzzle() {
        let config = PuzzleConfig::default();
        assert_eq!(generate(ANIMALS, 2024, &config), generate(ANIMALS, 2024, &config));
    }

    #[test]
    fn test_match_selection_accepts_both_directions() {
        let puzzle = generate(ANIMALS, 8, &PuzzleConfig::default());
        for placement in puzzle.placements() {
            let forward = puzzle.match_selection(placement.start, placement.end());
            assert_eq!(forward, Some(placement));

            let backward = puzzle.match_selection(placement.end(), placement.start);
            assert_eq!(backward, Some(placement));
        }
    }

    #[test]
    fn test_match_selection_rejects_partial_and_bent_lines() {
        let puzzle = generate(&["elephant"], 3, &PuzzleConfig::default());
        let placement = &puzzle.placements()[0];

        let cells: Vec<Position> = placement.cells().collect();
        assert_eq!(puzzle.match_selection(cells[0], cells[3]), None);

        let bent = Position::new(
            (placement.end().row + 1) % puzzle.size(),
            (placement.end().col + 2) % puzzle.size(),
        );
        assert_eq!(puzzle.match_selection(placement.start, bent), None);
    }

    #[test]
    fn test_read_line_rejects_non_lines() {
        let puzzle = generate(&["cat"], 0, &PuzzleConfig::default());
        assert_eq!(
            puzzle.read_line(Position::new(0, 0), Position::new(1, 2)),
            None
        );
        assert_eq!(
            puzzle.read_line(Position::new(0, 0), Position::new(0, 40)),
            None
        );
        assert_eq!(
            puzzle
                .read_line(Position::new(0, 0), Position::new(0, 2))
                .map(|s| s.len()),
            Some(3)
        );
    }

    #[test]
    fn test_selection_outside_grid_is_rejected() {
        let puzzle = generate(ANIMALS, 8, &PuzzleConfig::default());
        let origin = Position::new(0, 0);
        let far = Position::new(1 << 63, 0);

        assert_eq!(puzzle.match_selection(origin, far), None);
        assert_eq!(puzzle.match_selection(far, origin), None);
        assert_eq!(puzzle.read_line(origin, far), None);
        assert_eq!(
            puzzle.match_selection(origin, Position::new(puzzle.size(), 0)),
            None
        );
    }

    #[test]
    fn test_restricted_directions_are_respected() {
        let config = PuzzleConfig {
            directions: vec![Direction::East, Direction::South],
            ..PuzzleConfig::default()
        };
        let puzzle = generate(ANIMALS, 12, &config);
        assert!(
            puzzle
                .placements()
                .iter()
                .all(|p| matches!(p.direction, Direction::East | Direction::South))
        );
    }

    #[test]
    fn test_empty_word_list() {
        let empty: [&str; 0] = [];
        let puzzle = generate(&empty, 0, &PuzzleConfig::default());
        assert_eq!(puzzle.size(), 8);
        assert!(puzzle.placements().is_empty());
        assert_eq!(puzzle.rows().len(), 8);
    }

    #[test]
    fn test_puzzle_serializes_placements() {
        let puzzle = generate(&["owl"], 4, &PuzzleConfig::default());
        let json = serde_json::to_value(&puzzle).expect("serialize puzzle");
        assert_eq!(json["placements"][0]["word"], "OWL");
        assert!(json["placements"][0]["direction"].is_string());
    }
}
