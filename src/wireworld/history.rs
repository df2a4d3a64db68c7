//! Undo/redo over localized edit fragments.
//!
//! Each entry keeps the records that occupied the edited coordinates before
//! and after the edit. A coordinate missing from one side was absent from the
//! simulation at that point, so restoring a side reinstates presence as well
//! as value.

use tracing::debug;

use super::cell::{Cell, CellState};
use super::engine::Wireworld;
use super::store::CellStore;

/// A recorded edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub before: CellStore,
    pub after: CellStore,
}

/// Configuration for edit history.
#[derive(Clone, Debug)]
pub struct HistoryConfig {
    /// Maximum number of undo entries to keep. 0 = unlimited.
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 256 }
    }
}

impl HistoryConfig {
    pub fn unlimited() -> Self {
        Self { max_entries: 0 }
    }

    pub fn with_limit(max: usize) -> Self {
        Self { max_entries: max }
    }
}

#[derive(Clone, Debug, Default)]
pub struct History {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    config: HistoryConfig,
}

impl History {
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            config,
        }
    }

    /// Push an edit. Any redo entries are discarded.
    pub fn record_edit(&mut self, before: CellStore, after: CellStore) {
        self.undo.push(HistoryEntry { before, after });
        self.redo.clear();

        let max = self.config.max_entries;
        if max > 0 && self.undo.len() > max {
            let excess = self.undo.len() - max;
            self.undo.drain(..excess);
        }
    }

    /// Revert the most recent edit. Returns `false` if there was none.
    pub fn undo(&mut self, engine: &mut Wireworld) -> bool {
        let Some(entry) = self.undo.pop() else {
            return false;
        };
        engine.restore(&entry.before, &entry.after);
        debug!(undo = self.undo.len(), redo = self.redo.len() + 1, "undo");
        self.redo.push(entry);
        true
    }

    /// Reapply the most recently undone edit. Returns `false` if there was none.
    pub fn redo(&mut self, engine: &mut Wireworld) -> bool {
        let Some(entry) = self.redo.pop() else {
            return false;
        };
        engine.restore(&entry.after, &entry.before);
        debug!(undo = self.undo.len() + 1, redo = self.redo.len(), "redo");
        self.undo.push(entry);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Run `edit` and record how it changed the records at `coords`.
    fn record_around<R>(
        &mut self,
        engine: &mut Wireworld,
        coords: &CellStore,
        edit: impl FnOnce(&mut Wireworld) -> R,
    ) -> R {
        let before = engine.cells().capture(coords);
        let out = edit(engine);
        let after = engine.cells().capture(coords);
        if before != after {
            self.record_edit(before, after);
        }
        out
    }

    /// Recorded [`Wireworld::set`].
    pub fn set(&mut self, engine: &mut Wireworld, x: i32, y: i32, state: CellState) {
        let coords = CellStore::from_cells(vec![Cell::new(x, y, state)]);
        self.record_around(engine, &coords, |e| e.set(x, y, state));
    }

    /// Recorded [`Wireworld::load`].
    pub fn load(&mut self, engine: &mut Wireworld, x: i32, y: i32, patch: &CellStore) {
        let coords = patch.translated(x, y);
        self.record_around(engine, &coords, |e| e.load(x, y, patch));
    }

    /// Recorded [`Wireworld::unload`]. The implicit trim is recorded too.
    pub fn unload(&mut self, engine: &mut Wireworld, patch: &CellStore) {
        let coords: CellStore = patch
            .iter()
            .copied()
            .chain(empty_records(engine.cells()))
            .collect();
        self.record_around(engine, &coords, |e| e.unload(patch));
    }

    /// Recorded [`Wireworld::trim`].
    pub fn trim(&mut self, engine: &mut Wireworld) {
        let coords: CellStore = empty_records(engine.cells()).collect();
        self.record_around(engine, &coords, |e| e.trim());
    }

    /// Recorded [`Wireworld::translate`].
    pub fn translate(
        &mut self,
        engine: &mut Wireworld,
        selection: &CellStore,
        dx: i32,
        dy: i32,
    ) -> CellStore {
        let coords: CellStore = selection
            .iter()
            .copied()
            .chain(selection.translated(dx, dy).iter().copied())
            .chain(empty_records(engine.cells()))
            .collect();
        self.record_around(engine, &coords, |e| e.translate(selection, dx, dy))
    }
}

fn empty_records(store: &CellStore) -> impl Iterator<Item = Cell> + '_ {
    store.iter().filter(|c| c.state.is_empty()).copied()
}
