use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The offsets of the eight cells surrounding a given one (the Chebyshev neighbourhood), as `(row, column)` deltas.
const DISPLACEMENTS: [(i16, i16); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// A cell's position on the board: its row's and column's indices (respectively).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: u8,
    pub column: u8,
}

impl Position {
    pub const fn new(row: u8, column: u8) -> Self {
        Position { row, column }
    }

    /// Checks whether the position lies within a square board with the given side length.
    pub fn is_within(&self, size: u8) -> bool {
        self.row < size && self.column < size
    }

    /// The position's index in the row-major flattening of a square board of the given size.
    pub(crate) fn to_linear_index(self, size: u8) -> usize {
        self.row as usize * size as usize + self.column as usize
    }

    /// The inverse of [`Position::to_linear_index`].
    pub(crate) fn from_linear_index(index: usize, size: u8) -> Self {
        let size = size as usize;
        Position {
            row: (index / size) as u8,
            column: (index % size) as u8,
        }
    }

    /// Returns the positions of the cells adjacent to this one on a square board of the given size.
    ///
    /// The neighbourhood is clipped at the board's edges, so corner and edge cells simply have fewer neighbours.
    pub fn adjacent_positions(self, size: u8) -> impl Iterator<Item = Position> {
        // `i16` to be able to step below zero and above `u8::MAX` without overflowing.
        let (row, column) = (self.row as i16, self.column as i16);
        let size = size as i16;

        DISPLACEMENTS
            .into_iter()
            .map(move |(row_delta, column_delta)| (row + row_delta, column + column_delta))
            .filter(move |&(row, column)| row >= 0 && column >= 0 && row < size && column < size)
            .map(|(row, column)| Position::new(row as u8, column as u8))
    }
}

impl From<(u8, u8)> for Position {
    fn from((row, column): (u8, u8)) -> Self {
        Position { row, column }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}
