//! Rule table generation for Wireworld.

use super::cell::CellState;

/// Transition lookup indexed by current state and Head-neighbor count.
pub struct RuleTable {
    table: [[CellState; 9]; 4],
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleTable {
    pub const fn new() -> Self {
        let mut table = [[CellState::Empty; 9]; 4];
        let mut s = 0;
        while s < 4 {
            let mut heads = 0;
            while heads < 9 {
                table[s][heads] = output_for(CellState::ALL[s], heads as u8);
                heads += 1;
            }
            s += 1;
        }
        Self { table }
    }

    #[inline(always)]
    pub fn lookup(&self, state: CellState, heads: u8) -> CellState {
        self.table[state.index()][heads as usize]
    }
}

const fn output_for(state: CellState, heads: u8) -> CellState {
    match state {
        CellState::Empty => CellState::Empty,
        CellState::Wire if heads == 1 || heads == 2 => CellState::Head,
        CellState::Wire => CellState::Wire,
        CellState::Head => CellState::Tail,
        CellState::Tail => CellState::Wire,
    }
}

#[cfg(test)]
mod tests {
    use super::RuleTable;
    use crate::wireworld::CellState;

    fn expected_output(state: CellState, heads: u8) -> CellState {
        match (state, heads) {
            (CellState::Wire, 1..=2) => CellState::Head,
            (CellState::Wire, _) => CellState::Wire,
            (CellState::Head, _) => CellState::Tail,
            (CellState::Tail, _) => CellState::Wire,
            (CellState::Empty, _) => CellState::Empty,
        }
    }

    #[test]
    fn rule_table_matches_reference() {
        let table = RuleTable::new();
        for state in CellState::ALL {
            for heads in 0u8..=8 {
                assert_eq!(
                    table.lookup(state, heads),
                    expected_output(state, heads),
                    "state {state:?} heads {heads}"
                );
            }
        }
    }

    #[test]
    fn wire_fires_on_one_or_two_heads_only() {
        let table = RuleTable::new();
        assert_eq!(table.lookup(CellState::Wire, 0), CellState::Wire);
        assert_eq!(table.lookup(CellState::Wire, 1), CellState::Head);
        assert_eq!(table.lookup(CellState::Wire, 2), CellState::Head);
        assert_eq!(table.lookup(CellState::Wire, 3), CellState::Wire);
        assert_eq!(table.lookup(CellState::Wire, 8), CellState::Wire);
    }
}
