//! Sparse incremental Wireworld engine (4 states, Moore neighborhood).

pub mod presets;
pub mod wireworld;
pub use presets::Preset;
pub use wireworld::{
    Cell, CellState, CellStore, History, HistoryConfig, PatternError, Wireworld, WireworldConfig,
};
