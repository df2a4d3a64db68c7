//! Cell records and the four Wireworld states.

use std::cmp::Ordering;

use super::error::PatternError;

/// State of a single cell.
///
/// The discriminants are the values used by the flat triple encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellState {
    #[default]
    Empty = 0,
    Wire = 1,
    Head = 2,
    Tail = 3,
}

impl CellState {
    pub const ALL: [CellState; 4] = [
        CellState::Empty,
        CellState::Wire,
        CellState::Head,
        CellState::Tail,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Value used in the flat `(x, y, state)` encoding.
    #[inline]
    pub const fn raw(self) -> i32 {
        self as i32
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        matches!(self, CellState::Empty)
    }
}

impl TryFrom<i32> for CellState {
    type Error = PatternError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CellState::Empty),
            1 => Ok(CellState::Wire),
            2 => Ok(CellState::Head),
            3 => Ok(CellState::Tail),
            _ => Err(PatternError::UnknownState(value)),
        }
    }
}

/// A positioned cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub state: CellState,
}

impl Cell {
    #[inline]
    pub const fn new(x: i32, y: i32, state: CellState) -> Self {
        Self { x, y, state }
    }

    #[inline]
    pub const fn coord(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Store order: x ascending, then y ascending. State is ignored.
    #[inline]
    pub fn cmp_position(&self, other: &Cell) -> Ordering {
        self.x.cmp(&other.x).then(self.y.cmp(&other.y))
    }

    /// Compare this cell's position against a bare coordinate.
    #[inline]
    pub fn cmp_coord(&self, x: i32, y: i32) -> Ordering {
        self.x.cmp(&x).then(self.y.cmp(&y))
    }
}
