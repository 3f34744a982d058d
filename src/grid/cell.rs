use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// What a cell holds.
///
/// A cell either holds a bomb or it doesn't, in which case it knows how many bombs there are around it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellValue {
    /// A cell without a bomb. The parameter is the amount of bombs among the cell's (up to 8) neighbours.
    Count(u8),
    /// A cell with a bomb.
    Bomb,
}

/// Whether the player can see what the cell holds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStatus {
    Covered,
    Uncovered,
}

/// The representation of a cell.
///
/// The status only ever goes from [`CellStatus::Covered`] to [`CellStatus::Uncovered`], never back.
#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    value: CellValue,
    status: CellStatus,
}

impl Cell {
    /// Creates a new covered cell with no bombs around it.
    pub fn new() -> Self {
        Cell {
            value: CellValue::Count(0),
            status: CellStatus::Covered,
        }
    }

    pub fn value(&self) -> CellValue {
        self.value
    }

    pub fn status(&self) -> CellStatus {
        self.status
    }

    /// Checks whether the cell holds a bomb.
    pub fn is_bomb(&self) -> bool {
        self.value == CellValue::Bomb
    }

    /// Puts a bomb into the cell.
    pub(crate) fn plant_bomb(&mut self) {
        self.value = CellValue::Bomb;
    }

    /// Returns the amount of bombs around the cell or `None` if the cell itself holds a bomb.
    pub fn bombs_around(&self) -> Option<u8> {
        if let CellValue::Count(bombs_around) = self.value {
            Some(bombs_around)
        } else {
            None
        }
    }

    /// Checks whether the cell holds no bomb and has no bombs around it.
    pub fn is_zero(&self) -> bool {
        self.value == CellValue::Count(0)
    }

    /// Increments the amount of bombs around the cell.
    ///
    /// Won't produce any effect if the cell itself holds a bomb.
    pub(crate) fn increment_bombs_around(&mut self) {
        if let CellValue::Count(bombs_around) = self.value {
            self.value = CellValue::Count(bombs_around + 1);
        }
    }

    pub fn is_covered(&self) -> bool {
        self.status == CellStatus::Covered
    }

    pub fn is_uncovered(&self) -> bool {
        self.status == CellStatus::Uncovered
    }

    /// Uncovers the cell. Returns `true` if the cell was covered before the call.
    pub(crate) fn uncover(&mut self) -> bool {
        let was_covered = self.is_covered();
        self.status = CellStatus::Uncovered;
        was_covered
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::new()
    }
}

/// The `Debug` implementation shows what the cell holds regardless of its status.
impl Debug for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.value {
            CellValue::Count(0) => write!(f, "⬜"),
            CellValue::Count(n) => write!(f, "{n} "),
            CellValue::Bomb => write!(f, "💣"),
        }
    }
}

/// The `Display` implementation represents the cell the way the player sees it.
impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            CellStatus::Covered => write!(f, "⬛"),
            CellStatus::Uncovered => write!(f, "{:?}", self),
        }
    }
}
