//! Sparse Wireworld engine internals and public API.

mod cell;
pub(crate) mod coord_set;
mod engine;
mod error;
mod history;
mod neighbors;
mod rules;
mod store;

pub use cell::{Cell, CellState};
pub use engine::{Wireworld, WireworldConfig, scaled_interval};
pub use error::PatternError;
pub use history::{History, HistoryConfig, HistoryEntry};
pub use neighbors::{Direction, EMPTY_NEIGHBORS, NO_NEIGHBOR, NeighborCache, Neighbors};
pub use rules::RuleTable;
pub use store::CellStore;
