//! Pattern decoding errors.

use thiserror::Error;

/// Errors raised while decoding externally supplied cell patterns.
///
/// The engine itself never fails; these only surface when triples or preset
/// names come from outside the crate (command line, user input).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    /// The flat sequence does not split into whole `(x, y, state)` triples.
    #[error("pattern has {len} values, which is not a multiple of 3")]
    TruncatedTriples { len: usize },

    /// A single state value outside `0..=3`.
    #[error("invalid cell state {0} (expected 0..=3)")]
    UnknownState(i32),

    /// A triple whose state value is outside `0..=3`.
    #[error("triple {index} has invalid state {value} (expected 0..=3)")]
    InvalidState { index: usize, value: i32 },

    /// A preset name that does not match any built-in pattern.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}
