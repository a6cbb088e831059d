use serde::{Deserialize, Serialize};

/// One of the eight straight directions a word can run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Left to right.
    East,
    /// Right to left.
    West,
    /// Top to bottom.
    South,
    /// Bottom to top.
    North,
    /// Down and to the right.
    SouthEast,
    /// Up and to the left.
    NorthWest,
    /// Down and to the left.
    SouthWest,
    /// Up and to the right.
    NorthEast,
}

impl Direction {
    /// All eight directions, forward directions first.
    pub const ALL: [Self; 8] = [
        Self::East,
        Self::South,
        Self::SouthEast,
        Self::NorthEast,
        Self::West,
        Self::North,
        Self::NorthWest,
        Self::SouthWest,
    ];

    /// `(row, col)` step taken for each letter.
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Self::East => (0, 1),
            Self::West => (0, -1),
            Self::South => (1, 0),
            Self::North => (-1, 0),
            Self::SouthEast => (1, 1),
            Self::NorthWest => (-1, -1),
            Self::SouthWest => (1, -1),
            Self::NorthEast => (-1, 1),
        }
    }

    /// Direction matching a unit step, if any.
    pub const fn from_delta(dr: isize, dc: isize) -> Option<Self> {
        match (dr, dc) {
            (0, 1) => Some(Self::East),
            (0, -1) => Some(Self::West),
            (1, 0) => Some(Self::South),
            (-1, 0) => Some(Self::North),
            (1, 1) => Some(Self::SouthEast),
            (-1, -1) => Some(Self::NorthWest),
            (1, -1) => Some(Self::SouthWest),
            (-1, 1) => Some(Self::NorthEast),
            _ => None,
        }
    }

    /// The opposite direction.
    pub const fn reversed(self) -> Self {
        match self {
            Self::East => Self::West,
            Self::West => Self::East,
            Self::South => Self::North,
            Self::North => Self::South,
            Self::SouthEast => Self::NorthWest,
            Self::NorthWest => Self::SouthEast,
            Self::SouthWest => Self::NorthEast,
            Self::NorthEast => Self::SouthWest,
        }
    }
}

/// Zero-based grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Row index, top row is 0.
    pub row: usize,
    /// Column index, leftmost column is 0.
    pub col: usize,
}

impl Position {
    /// Position at `row`, `col`.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Move `steps` cells in `direction`, staying inside a `size` x `size` grid.
    pub fn step(self, direction: Direction, steps: usize, size: usize) -> Option<Self> {
        let (dr, dc) = direction.delta();
        let steps = isize::try_from(steps).ok()?;
        let row = isize::try_from(self.row).ok()? + dr * steps;
        let col = isize::try_from(self.col).ok()? + dc * steps;
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        (row < size && col < size).then_some(Self { row, col })
    }

    /// Straight-line direction and length (in cells, inclusive) from `self` to `other`.
    ///
    /// Returns `None` unless the two positions lie on a horizontal, vertical
    /// or 45° diagonal line and are distinct. Coordinates too large for `isize` yield `None`.
    pub fn line_to(self, other: Self) -> Option<(Direction, usize)> {
        let dr = isize::try_from(other.row)
            .ok()?
            .checked_sub(isize::try_from(self.row).ok()?)?;
        let dc = isize::try_from(other.col)
            .ok()?
            .checked_sub(isize::try_from(self.col).ok()?)?;
        if dr == 0 && dc == 0 {
            return None;
        }
        let (rows, cols) = (dr.unsigned_abs(), dc.unsigned_abs());
        if dr != 0 && dc != 0 && rows != cols {
            return None;
        }
        let direction = Direction::from_delta(dr.signum(), dc.signum())?;
        Some((direction, rows.max(cols).checked_add(1)?))
    }
}

/// A word written on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Normalized word, uppercase A–Z.
    pub word: String,
    /// Cell holding the first letter.
    pub start: Position,
    /// Direction the word reads in from `start`.
    pub direction: Direction,
}

impl Placement {
    /// Number of cells the word covers.
    pub fn len(&self) -> usize {
        self.word.len()
    }

    /// Whether the word has no letters.
    pub fn is_empty(&self) -> bool {
        self.word.is_empty()
    }

    /// Position of the last letter.
    pub fn end(&self) -> Position {
        let (dr, dc) = self.direction.delta();
        let steps = self.len().saturating_sub(1) as isize;
        Position {
            row: (self.start.row as isize + dr * steps) as usize,
            col: (self.start.col as isize + dc * steps) as usize,
        }
    }

    /// Cells covered by the word, in reading order.
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        let (dr, dc) = self.direction.delta();
        (0..self.len()).map(move |i| Position {
            row: (self.start.row as isize + dr * i as isize) as usize,
            col: (self.start.col as isize + dc * i as isize) as usize,
        })
    }

    /// Whether a selection from `a` to `b` covers exactly this word, in either direction.
    pub fn spans(&self, a: Position, b: Position) -> bool {
        let end = self.end();
        (self.start == a && end == b) || (self.start == b && end == a)
    }
}
