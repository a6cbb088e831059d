use std::collections::HashSet;

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    Direction, Placement, Position, PuzzleConfig, grid_size, normalize_word, puzzle::Puzzle,
};

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a puzzle hiding `words`.
///
/// Words are normalized with [`normalize_word`], de-duplicated and placed
/// longest first. For every word all in-bounds placements that do not clash
/// with letters already on the grid are scored by how many cells they share
/// with existing words; ties are broken by the seeded RNG and the best
/// candidates are tried first.
///
/// When a word runs out of candidates the generator undoes the previous word
/// and moves it to its next candidate. After `max_backtracks` undos in total,
/// a word without candidates is skipped and reported in [`Puzzle::skipped`].
pub fn generate<S: AsRef<str>>(words: &[S], seed: u64, config: &PuzzleConfig) -> Puzzle {
    let words = prepare_words(words);
    let size = grid_size(&words, config);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut grid = Grid::new(size);

    let placements = place_words(&mut grid, &words, config, &mut rng);

    let skipped = {
        let placed: HashSet<&str> = placements.iter().map(|p| p.word.as_str()).collect();
        words
            .iter()
            .filter(|w| !placed.contains(w.as_str()))
            .cloned()
            .collect()
    };

    let cells = grid.fill(&mut rng);

    Puzzle::new(size, cells, placements, skipped)
}

/// Normalize, de-duplicate and order the words longest first (stable).
fn prepare_words<S: AsRef<str>>(words: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut prepared: Vec<String> = words
        .iter()
        .filter_map(|w| normalize_word(w.as_ref()))
        .filter(|w| seen.insert(w.clone()))
        .collect();
    prepared.sort_by(|a, b| b.len().cmp(&a.len()));
    prepared
}

/// A word on the placement stack together with its remaining candidates.
struct Frame {
    word: usize,
    candidates: Vec<Placement>,
    next: usize,
    written: Vec<usize>,
}

fn place_words(
    grid: &mut Grid,
    words: &[String],
    config: &PuzzleConfig,
    rng: &mut StdRng,
) -> Vec<Placement> {
    let mut frames: Vec<Frame> = Vec::with_capacity(words.len());
    let mut backtracks = 0;
    let mut next_word = 0;

    while next_word < words.len() {
        let word = &words[next_word];
        if word.len() > grid.size {
            next_word += 1;
            continue;
        }

        let candidates = grid.candidates(word, &config.directions, config.candidate_limit, rng);
        frames.push(Frame {
            word: next_word,
            candidates,
            next: 0,
            written: Vec::new(),
        });

        match advance(grid, &mut frames, &mut backtracks, config.max_backtracks) {
            Some(word) => next_word = word,
            None => break,
        }
    }

    frames
        .into_iter()
        .filter_map(|mut frame| {
            let placed = frame.next.checked_sub(1)?;
            Some(frame.candidates.swap_remove(placed))
        })
        .collect()
}

/// Place the top frame's next candidate, backtracking when it has none.
///
/// Returns the index of the next word to place.
fn advance(
    grid: &mut Grid,
    frames: &mut Vec<Frame>,
    backtracks: &mut usize,
    max_backtracks: usize,
) -> Option<usize> {
    loop {
        let frame = frames.last_mut()?;

        if let Some(candidate) = frame.candidates.get(frame.next) {
            frame.next += 1;
            frame.written = grid.write(candidate);
            return Some(frame.word + 1);
        }

        if *backtracks < max_backtracks && frames.len() > 1 {
            *backtracks += 1;
            frames.pop();
            if let Some(previous) = frames.last_mut() {
                grid.erase(&previous.written);
                previous.written.clear();
            }
            continue;
        }

        // Out of options: drop the word and move on
        let skipped = frames.pop()?;
        return Some(skipped.word + 1);
    }
}

/// Letters written so far; `None` marks an empty cell.
struct Grid {
    size: usize,
    cells: Vec<Option<u8>>,
}

impl Grid {
    fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    const fn index(&self, position: Position) -> usize {
        position.row * self.size + position.col
    }

    /// Number of letters `word` would share with the grid at this placement,
    /// or `None` if it clashes or leaves the grid.
    fn shared_letters(&self, word: &str, start: Position, direction: Direction) -> Option<usize> {
        let mut shared = 0;
        for (i, letter) in word.bytes().enumerate() {
            let position = start.step(direction, i, self.size)?;
            match self.cells[self.index(position)] {
                None => {}
                Some(existing) if existing == letter => shared += 1,
                Some(_) => return None,
            }
        }
        Some(shared)
    }

    /// Candidate placements for `word`, best intersection score first.
    fn candidates(
        &self,
        word: &str,
        directions: &[Direction],
        limit: usize,
        rng: &mut StdRng,
    ) -> Vec<Placement> {
        let len = word.len();
        let mut scored = Vec::new();

        for &direction in directions {
            for row in 0..self.size {
                for col in 0..self.size {
                    let start = Position::new(row, col);
                    if start.step(direction, len.saturating_sub(1), self.size).is_none() {
                        continue;
                    }
                    match self.shared_letters(word, start, direction) {
                        // A word lying entirely on existing letters is not a new word
                        Some(shared) if shared < len => scored.push((shared, start, direction)),
                        _ => {}
                    }
                }
            }
        }

        scored.shuffle(rng);
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(limit.max(1));

        scored
            .into_iter()
            .map(|(_, start, direction)| Placement {
                word: word.to_string(),
                start,
                direction,
            })
            .collect()
    }

    /// Write a placement, returning the indices of cells that were empty before.
    fn write(&mut self, placement: &Placement) -> Vec<usize> {
        let mut written = Vec::new();
        for (position, letter) in placement.cells().zip(placement.word.bytes()) {
            let index = self.index(position);
            if self.cells[index].is_none() {
                self.cells[index] = Some(letter);
                written.push(index);
            }
        }
        written
    }

    fn erase(&mut self, written: &[usize]) {
        for &index in written {
            self.cells[index] = None;
        }
    }

    /// Final letters, empty cells replaced with random `A`-`Z`.
    fn fill(self, rng: &mut StdRng) -> Vec<char> {
        self.cells
            .into_iter()
            .map(|cell| {
                let letter = cell.unwrap_or_else(|| ALPHABET[rng.gen_range(0..ALPHABET.len())]);
                char::from(letter)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_prepare_words_dedups_and_sorts() {
        let words = prepare_words(&["cat", "Giraffe", "CAT", "x", "zebra"]);
        assert_eq!(words, vec!["GIRAFFE", "ZEBRA", "CAT"]);
    }

    #[test]
    fn test_candidates_prefer_intersections() {
        let mut grid = Grid::new(5);
        let cat = Placement {
            word: "CAT".to_string(),
            start: Position::new(0, 0),
            direction: Direction::East,
        };
        grid.write(&cat);

        let candidates = grid.candidates("TOP", &Direction::ALL, 500, &mut seeded());
        assert!(!candidates.is_empty());

        // The best candidate must reuse the T of CAT
        let best = &candidates[0];
        assert!(best.cells().any(|p| p == Position::new(0, 2)));
        assert_eq!(
            grid.shared_letters(&best.word, best.start, best.direction),
            Some(1)
        );
    }

    #[test]
    fn test_candidates_reject_clashes_and_full_overlap() {
        let mut grid = Grid::new(3);
        grid.write(&Placement {
            word: "ABC".to_string(),
            start: Position::new(0, 0),
            direction: Direction::East,
        });

        let candidates = grid.candidates("ABC", &[Direction::East], 100, &mut seeded());
        // Row 0 is taken by the identical word, so only rows 1 and 2 remain
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.start.row != 0));

        let candidates = grid.candidates("XYZ", &[Direction::East], 100, &mut seeded());
        assert!(candidates.iter().all(|c| c.start.row != 0));
    }

    #[test]
    fn test_write_and_erase_keep_shared_letters() {
        let mut grid = Grid::new(4);
        let first = Placement {
            word: "DOG".to_string(),
            start: Position::new(0, 0),
            direction: Direction::South,
        };
        let second = Placement {
            word: "GUM".to_string(),
            start: Position::new(2, 0),
            direction: Direction::East,
        };
        grid.write(&first);
        let written = grid.write(&second);
        assert_eq!(written.len(), 2, "the shared G must not be recorded");

        grid.erase(&written);
        assert_eq!(grid.cells[grid.index(Position::new(2, 0))], Some(b'G'));
        assert_eq!(grid.cells[grid.index(Position::new(2, 1))], None);
    }

    #[test]
    fn test_tight_layout_fills_every_row() {
        // Three 3-letter words in a 3x3 grid running east only: each takes a full row
        let config = PuzzleConfig {
            min_size: 3,
            max_size: 3,
            directions: vec![Direction::East],
            ..PuzzleConfig::default()
        };
        let puzzle = generate(&["AAA", "BBB", "CCC"], 3, &config);
        assert_eq!(puzzle.size(), 3);
        assert_eq!(puzzle.placements().len(), 3);
        assert!(puzzle.skipped().is_empty());
    }

    #[test]
    fn test_unplaceable_words_are_skipped() {
        let config = PuzzleConfig {
            min_size: 3,
            max_size: 3,
            directions: vec![Direction::East],
            max_backtracks: 4,
            ..PuzzleConfig::default()
        };
        let puzzle = generate(&["AAA", "BBB", "CCC", "DDD", "ABCDEFG"], 11, &config);
        assert_eq!(puzzle.placements().len(), 3);
        let mut skipped = puzzle.skipped().to_vec();
        skipped.sort();
        assert_eq!(skipped.len(), 2);
        assert!(skipped.contains(&"ABCDEFG".to_string()));
    }
}
