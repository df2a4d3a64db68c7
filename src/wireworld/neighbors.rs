//! Neighbor adjacency cache.
//!
//! One `[u32; 8]` record per live cell holding the store index of each Moore
//! neighbor, or `NO_NEIGHBOR`. The cache is a pure function of the store's
//! content and order; the engine decides when it is stale.

use super::cell::{Cell, CellState};
use super::store::CellStore;

/// The 8 cardinal and intercardinal directions for neighbor addressing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    North = 0, // (x, y-1)
    South = 1, // (x, y+1)
    West  = 2, // (x-1, y)
    East  = 3, // (x+1, y)
    NW    = 4, // (x-1, y-1)
    NE    = 5, // (x+1, y-1)
    SW    = 6, // (x-1, y+1)
    SE    = 7, // (x+1, y+1)
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North, Direction::South,
        Direction::West,  Direction::East,
        Direction::NW,    Direction::NE,
        Direction::SW,    Direction::SE,
    ];

    /// The coordinate offset for this direction (y grows downwards).
    #[inline]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::West  => (-1, 0),
            Direction::East  => (1, 0),
            Direction::NW    => (-1, -1),
            Direction::NE    => (1, -1),
            Direction::SW    => (-1, 1),
            Direction::SE    => (1, 1),
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Sentinel value for "no neighbor".
pub const NO_NEIGHBOR: u32 = u32::MAX;

/// Neighbor store indices for one cell. Indexed by `Direction`.
pub type Neighbors = [u32; 8];

/// An empty neighbor array (all `NO_NEIGHBOR`).
pub const EMPTY_NEIGHBORS: Neighbors = [NO_NEIGHBOR; 8];

#[derive(Clone, Debug, Default)]
pub struct NeighborCache {
    slots: Vec<Neighbors>,
}

impl NeighborCache {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Match the live cell count. Contents are meaningless until `rebuild`.
    #[inline]
    pub fn resize(&mut self, len: usize) {
        self.slots.resize(len, EMPTY_NEIGHBORS);
    }

    #[inline]
    pub fn get(&self, index: usize) -> &Neighbors {
        &self.slots[index]
    }

    /// Recompute every record from scratch against `store`.
    ///
    /// n lookups of O(log n) each. Precondition: `store` is sorted.
    pub fn rebuild(&mut self, store: &CellStore) {
        assert!(
            store.len() < NO_NEIGHBOR as usize,
            "cell store too large for u32 neighbor indices"
        );
        self.slots.clear();
        self.slots.reserve(store.len());

        for cell in store {
            let mut nb = EMPTY_NEIGHBORS;
            for dir in Direction::ALL {
                let (dx, dy) = dir.offset();
                // Neighbors past the i32 edge of the plane do not exist.
                let (Some(nx), Some(ny)) = (cell.x.checked_add(dx), cell.y.checked_add(dy))
                else {
                    continue;
                };
                if let Some(j) = store.index_of(nx, ny) {
                    nb[dir.index()] = j as u32;
                }
            }
            self.slots.push(nb);
        }
    }

    /// Number of Head cells among the cached neighbors of `index`.
    #[inline(always)]
    pub fn head_count(&self, index: usize, cells: &[Cell]) -> u8 {
        let nb = &self.slots[index];
        let mut heads = 0u8;
        for &j in nb {
            if j != NO_NEIGHBOR && cells[j as usize].state == CellState::Head {
                heads += 1;
            }
        }
        heads
    }
}
