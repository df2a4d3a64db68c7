//! Built-in Wireworld components.
//!
//! Each component is a flat list of `(x, y, state)` triples anchored at its
//! top-left corner, with states 0 = empty, 1 = wire, 2 = electron head and
//! 3 = electron tail. Empty cells are left out.
//!
//! ref: https://www.quinapalus.com/wi-index.html

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::wireworld::{Cell, CellState, CellStore, PatternError};

const FIELD_WIRE_DENSITY: f64 = 0.45;
const FIELD_HEAD_DENSITY: f64 = 0.04;
const FIELD_TAIL_DENSITY: f64 = 0.02;

/// Clock with a 4-cycle interval.
pub const CLOCK4: &[i32] = &[1, 0, 2, 0, 1, 1, 2, 1, 3, 1, 2, 1];

/// One-way wire.
#[rustfmt::skip]
pub const DIODE: &[i32] = &[
    3, 0, 1, 4, 0, 1,
    0, 1, 3, 1, 1, 2,
    2, 1, 1, 4, 1, 1,
    5, 1, 1, 6, 1, 1,
    3, 2, 1, 4, 2, 1,
];

/// OR gate.
#[rustfmt::skip]
pub const OR: &[i32] = &[
    0, 0, 1, 1, 0, 1, 2, 0, 1, 3, 1, 1,
    2, 2, 1, 3, 2, 1, 4, 2, 1, 5, 2, 1, 6, 2, 1,
    3, 3, 1, 0, 4, 1, 1, 4, 1, 2, 4, 1,
];

/// Exclusive-OR gate.
#[rustfmt::skip]
pub const XOR: &[i32] = &[
    0, 0, 1, 1, 0, 1, 2, 0, 1, 3, 1, 1,
    2, 2, 1, 3, 2, 1, 4, 2, 1, 5, 2, 1,
    2, 3, 1, 5, 3, 1, 6, 3, 1, 7, 3, 1, 8, 3, 1,
    2, 4, 1, 3, 4, 1, 4, 4, 1, 5, 4, 1,
    3, 5, 1, 0, 6, 1, 1, 6, 1, 2, 6, 1,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Preset {
    Clock4,
    Diode,
    Or,
    Xor,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Clock4, Preset::Diode, Preset::Or, Preset::Xor];

    pub const fn name(self) -> &'static str {
        match self {
            Preset::Clock4 => "clock4",
            Preset::Diode => "diode",
            Preset::Or => "or",
            Preset::Xor => "xor",
        }
    }

    pub const fn triples(self) -> &'static [i32] {
        match self {
            Preset::Clock4 => CLOCK4,
            Preset::Diode => DIODE,
            Preset::Or => OR,
            Preset::Xor => XOR,
        }
    }

    /// Decoded cells, ready for `load`.
    pub fn cells(self) -> CellStore {
        CellStore::from_triples(self.triples())
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PatternError::UnknownPreset(wanted.to_string()))
    }
}

/// Random `side` x `side` wire field anchored at the origin, sorted.
///
/// Roughly 45% of the positions hold wire, with a sprinkling of electron
/// heads and tails so the field has activity from the first step.
pub fn random_field(side: i32, seed: u64) -> CellStore {
    let mut rng = StdRng::seed_from_u64(seed);
    let side = side.max(0);
    let mut cells = CellStore::new();
    for x in 0..side {
        for y in 0..side {
            let roll = rng.random::<f64>();
            let state = if roll < FIELD_HEAD_DENSITY {
                CellState::Head
            } else if roll < FIELD_HEAD_DENSITY + FIELD_TAIL_DENSITY {
                CellState::Tail
            } else if roll < FIELD_WIRE_DENSITY {
                CellState::Wire
            } else {
                continue;
            };
            cells.push(Cell::new(x, y, state));
        }
    }
    cells
}
