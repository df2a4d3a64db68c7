use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::cell::{Cell, CellState};
use super::coord_set::CoordSet;
use super::neighbors::NeighborCache;
use super::rules::RuleTable;
use super::store::CellStore;

const DEFAULT_STEP_INTERVAL: Duration = Duration::from_millis(50);
const MIN_STEP_INTERVAL: Duration = Duration::from_micros(1);
const STEP_INTERVAL_ENV: &str = "WIREWORLD_STEP_INTERVAL_MS";

#[inline]
fn env_step_interval() -> Option<Duration> {
    std::env::var(STEP_INTERVAL_ENV)
        .ok()
        .and_then(|v| {
            let v = v.trim();
            if v.is_empty() {
                None
            } else {
                v.parse::<u64>().ok()
            }
        })
        .filter(|&ms| ms > 0)
        .map(Duration::from_millis)
}

#[inline]
fn resolve_step_interval(config: &WireworldConfig) -> Duration {
    config
        .step_interval
        .or_else(env_step_interval)
        .unwrap_or(DEFAULT_STEP_INTERVAL)
        .max(MIN_STEP_INTERVAL)
}

/// Round down to the coarsest unit (s, ms, µs) not larger than `v`.
#[inline]
fn round_interval(v: Duration) -> Duration {
    if v >= Duration::from_secs(1) {
        Duration::from_secs(v.as_secs())
    } else if v >= Duration::from_millis(1) {
        Duration::from_millis(v.as_millis() as u64)
    } else {
        Duration::from_micros(v.as_micros() as u64)
    }
}

/// Halve (`delta == -1`) or double (`delta == 1`) a step interval, clamped
/// to 1 µs and rounded for display.
///
/// # Panics
/// If `delta` is not -1 or 1.
pub fn scaled_interval(current: Duration, delta: i32) -> Duration {
    assert!(
        delta == -1 || delta == 1,
        "interval scale delta must be -1 or +1, got {delta}"
    );
    let v = if delta < 0 {
        current / 2
    } else {
        current.saturating_mul(2)
    };
    round_interval(v.max(MIN_STEP_INTERVAL))
}

/// Configuration for a Wireworld engine instance.
///
/// Use `WireworldConfig::default()` for defaults, or customise individual
/// knobs via the builder methods.
#[derive(Clone, Debug, Default)]
pub struct WireworldConfig {
    /// Minimum wall-clock time between scheduled steps.
    /// `None` reads `WIREWORLD_STEP_INTERVAL_MS`, falling back to 50 ms.
    pub step_interval: Option<Duration>,
    /// Whether scheduled stepping is enabled from the start.
    pub start_running: bool,
    /// Expected live cell count, used to pre-size the buffers.
    pub capacity: Option<usize>,
}

impl WireworldConfig {
    /// Set an explicit step interval (clamped to at least 1 µs).
    pub fn step_interval(mut self, interval: Duration) -> Self {
        self.step_interval = Some(interval.max(MIN_STEP_INTERVAL));
        self
    }

    pub fn running(mut self, running: bool) -> Self {
        self.start_running = running;
        self
    }

    pub fn capacity(mut self, cells: usize) -> Self {
        self.capacity = Some(cells);
        self
    }
}

/// Sparse Wireworld simulation.
///
/// `live` is always sorted. `scratch` and `neighbors` always have the same
/// length as `live`; their contents are only meaningful inside a step.
pub struct Wireworld {
    live: CellStore,
    scratch: CellStore,
    neighbors: NeighborCache,
    /// Set by every structural edit, cleared only by a step.
    neighbors_stale: bool,
    changed: bool,
    running: bool,
    step_interval: Duration,
    last_step_at: Instant,
    generation: u64,
    rules: RuleTable,
    /// Reusable coordinate index for history restores.
    edit_index: CoordSet,
}

impl Default for Wireworld {
    fn default() -> Self {
        Self::new()
    }
}

impl Wireworld {
    pub fn new() -> Self {
        Self::with_config(WireworldConfig::default())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(config: WireworldConfig) -> Self {
        let step_interval = resolve_step_interval(&config);
        let capacity = config.capacity.unwrap_or(0);
        debug!(?step_interval, capacity, "creating wireworld engine");

        Self {
            live: CellStore::with_capacity(capacity),
            scratch: CellStore::with_capacity(capacity),
            neighbors: NeighborCache::with_capacity(capacity),
            neighbors_stale: false,
            changed: false,
            running: config.start_running,
            step_interval,
            last_step_at: Instant::now(),
            generation: 0,
            rules: RuleTable::new(),
            edit_index: CoordSet::new(),
        }
    }

    /// Match scratch and neighbor buffers to the live count after a
    /// structural edit.
    fn sync_buffers(&mut self) {
        let len = self.live.len();
        self.scratch.resize(len);
        self.neighbors.resize(len);
        self.neighbors_stale = true;
        self.changed = true;
    }

    /// Set the cell at (x, y).
    ///
    /// An existing cell is overwritten in place (set to Empty, it stays in
    /// the store until `trim`). A new non-Empty cell is inserted at its
    /// ordered position. Setting an absent cell to Empty does nothing.
    pub fn set(&mut self, x: i32, y: i32, state: CellState) {
        if let Some(i) = self.live.index_of(x, y) {
            let cell = &mut self.live.as_mut_slice()[i];
            if cell.state != state {
                cell.state = state;
                self.changed = true;
            }
            return;
        }

        if state.is_empty() {
            return;
        }

        self.live.insert_sorted(Cell::new(x, y, state));
        self.scratch.push(Cell::default());
        self.neighbors.resize(self.live.len());
        self.neighbors_stale = true;
        self.changed = true;
    }

    /// State at (x, y), or `None` if no record exists there.
    pub fn get(&self, x: i32, y: i32) -> Option<CellState> {
        self.live.state_at(x, y)
    }

    /// Stamp `patch` into the simulation with its origin at (x, y).
    pub fn load(&mut self, x: i32, y: i32, patch: &CellStore) {
        let before = self.live.len();
        self.live.load(x, y, patch);
        self.live.sort();
        self.sync_buffers();
        debug!(
            x,
            y,
            patch = patch.len(),
            added = self.live.len() - before,
            "loaded patch"
        );
    }

    /// Remove every coordinate of `patch` from the simulation.
    ///
    /// Like the store operation this trims, so Empty records elsewhere are
    /// dropped as well.
    pub fn unload(&mut self, patch: &CellStore) {
        let before = self.live.len();
        self.live.unload(patch);
        self.sync_buffers();
        debug!(
            patch = patch.len(),
            removed = before - self.live.len(),
            "unloaded patch"
        );
    }

    /// Drop all Empty records.
    pub fn trim(&mut self) {
        let before = self.live.len();
        self.live = self.live.trim();
        self.sync_buffers();
        debug!(removed = before - self.live.len(), "trimmed empty cells");
    }

    /// Move the cells at the coordinates of `selection` by (dx, dy).
    ///
    /// Only non-Empty cells move. They overwrite whatever they land on.
    /// Returns the moved cells at their new positions.
    pub fn translate(&mut self, selection: &CellStore, dx: i32, dy: i32) -> CellStore {
        let picked = self.live.capture(selection).trim();
        if (dx, dy) == (0, 0) || picked.is_empty() {
            return picked;
        }

        let moved = picked.translated(dx, dy);
        self.live.unload(&picked);
        self.live.load(0, 0, &moved);
        self.live.sort();
        self.live = self.live.trim();
        self.sync_buffers();
        debug!(cells = moved.len(), dx, dy, "translated selection");
        moved
    }

    /// Reinstate one side of a history entry.
    ///
    /// Coordinates of `previous` that are absent from `target` are removed;
    /// every record of `target` is written back, inserted if missing.
    pub fn restore(&mut self, target: &CellStore, previous: &CellStore) {
        self.edit_index.clear();
        self.edit_index.reserve_for(target.len());
        for c in target {
            self.edit_index.insert(c.x, c.y);
        }
        let gone: CellStore = previous
            .iter()
            .filter(|c| !self.edit_index.contains(c.x, c.y))
            .copied()
            .collect();

        self.live.remove(&gone);
        self.live.load(0, 0, target);
        self.live.sort();
        self.sync_buffers();
        debug!(
            restored = target.len(),
            removed = gone.len(),
            "restored history fragment"
        );
    }

    /// Advance one generation.
    ///
    /// Unless `force` is set this only runs while the simulation is running
    /// and at least one step interval has passed since the last executed
    /// step. Returns whether a step was executed.
    pub fn step(&mut self, force: bool) -> bool {
        self.step_at(force, Instant::now())
    }

    /// [`Wireworld::step`] with an explicit clock reading.
    pub fn step_at(&mut self, force: bool, now: Instant) -> bool {
        if !force {
            if !self.running {
                return false;
            }
            if now.saturating_duration_since(self.last_step_at) < self.step_interval {
                return false;
            }
        }

        self.last_step_at = now;
        self.step_impl();
        true
    }

    /// Run `n` forced steps.
    pub fn step_n(&mut self, n: u64) {
        for _ in 0..n {
            self.step_at(true, Instant::now());
        }
    }

    fn step_impl(&mut self) {
        if self.neighbors_stale {
            self.neighbors.rebuild(&self.live);
            self.neighbors_stale = false;
            debug!(cells = self.live.len(), "rebuilt neighbor cache");
        }
        debug_assert_eq!(self.scratch.len(), self.live.len());
        debug_assert_eq!(self.neighbors.len(), self.live.len());

        let cells = self.live.as_slice();
        let next = self.scratch.as_mut_slice();
        for (i, (cell, out)) in cells.iter().zip(next.iter_mut()).enumerate() {
            let heads = if cell.state == CellState::Wire {
                self.neighbors.head_count(i, cells)
            } else {
                0
            };
            *out = Cell::new(cell.x, cell.y, self.rules.lookup(cell.state, heads));
        }

        std::mem::swap(&mut self.live, &mut self.scratch);
        self.changed = true;
        self.generation += 1;
        trace!(generation = self.generation, cells = self.live.len(), "stepped");
    }

    /// Toggle scheduled stepping and return the new state.
    pub fn toggle_running(&mut self) -> bool {
        self.set_running(!self.running);
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
        self.last_step_at = Instant::now();
    }

    #[inline]
    pub fn running(&self) -> bool {
        self.running
    }

    /// Halve (`-1`) or double (`+1`) the step interval.
    ///
    /// # Panics
    /// If `delta` is not -1 or 1.
    pub fn scale_interval(&mut self, delta: i32) {
        self.step_interval = scaled_interval(self.step_interval, delta);
        debug!(interval = ?self.step_interval, "scaled step interval");
    }

    #[inline]
    pub fn step_interval(&self) -> Duration {
        self.step_interval
    }

    /// Whether anything changed since the last call. Clears the flag.
    #[inline]
    pub fn cells_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.live.len()
    }

    /// Read view of the live cells, sorted by (x, y).
    #[inline]
    pub fn cells(&self) -> &CellStore {
        &self.live
    }

    /// Whether the next step has to rebuild the neighbor cache.
    #[inline]
    pub fn neighbors_stale(&self) -> bool {
        self.neighbors_stale
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{
        DEFAULT_STEP_INTERVAL, MIN_STEP_INTERVAL, Wireworld, WireworldConfig, round_interval,
        scaled_interval,
    };
    use crate::wireworld::{CellState, CellStore};

    fn engine_with(triples: &[i32]) -> Wireworld {
        let mut engine = Wireworld::with_config(
            WireworldConfig::default().step_interval(DEFAULT_STEP_INTERVAL),
        );
        engine.load(0, 0, &CellStore::from_triples(triples));
        engine
    }

    fn assert_buffers_in_lockstep(engine: &Wireworld) {
        assert_eq!(engine.scratch.len(), engine.live.len());
        assert_eq!(engine.neighbors.len(), engine.live.len());
        assert!(engine.live.is_sorted());
    }

    #[test]
    fn value_only_set_keeps_neighbor_cache_valid() {
        let mut engine = engine_with(&[0, 0, 1, 1, 0, 1]);
        engine.step(true);
        assert!(!engine.neighbors_stale);

        engine.set(0, 0, CellState::Head);
        assert!(!engine.neighbors_stale);
        assert!(engine.cells_changed());

        engine.set(5, 5, CellState::Wire);
        assert!(engine.neighbors_stale);
        assert_buffers_in_lockstep(&engine);
    }

    #[test]
    fn set_same_value_does_not_raise_changed() {
        let mut engine = engine_with(&[0, 0, 1]);
        assert!(engine.cells_changed());
        engine.set(0, 0, CellState::Wire);
        assert!(!engine.cells_changed());
        engine.set(3, 3, CellState::Empty);
        assert!(!engine.cells_changed());
        assert_eq!(engine.cell_count(), 1);
    }

    #[test]
    fn every_structural_edit_resizes_buffers() {
        let mut engine = Wireworld::new();
        engine.set(2, 2, CellState::Wire);
        engine.set(-1, 2, CellState::Head);
        assert_buffers_in_lockstep(&engine);

        engine.load(10, 10, &CellStore::from_triples(&[0, 0, 1, 1, 0, 1]));
        assert_buffers_in_lockstep(&engine);

        engine.set(2, 2, CellState::Empty);
        engine.trim();
        assert_buffers_in_lockstep(&engine);
        assert_eq!(engine.cell_count(), 3);

        engine.unload(&CellStore::from_triples(&[10, 10, 0]));
        assert_buffers_in_lockstep(&engine);
        assert_eq!(engine.cell_count(), 2);

        engine.step(true);
        assert_buffers_in_lockstep(&engine);
    }

    #[test]
    fn step_swaps_buffers_without_reallocating() {
        let mut engine = engine_with(&[0, 0, 2, 1, 0, 1]);
        let live_ptr = engine.live.as_slice().as_ptr();
        let scratch_ptr = engine.scratch.as_slice().as_ptr();
        engine.step(true);
        assert_eq!(engine.live.as_slice().as_ptr(), scratch_ptr);
        assert_eq!(engine.scratch.as_slice().as_ptr(), live_ptr);
        engine.step(true);
        assert_eq!(engine.live.as_slice().as_ptr(), live_ptr);
    }

    #[test]
    fn unforced_step_waits_for_running_and_interval() {
        let mut engine = engine_with(&[0, 0, 2]);
        let interval = engine.step_interval();
        let t0 = engine.last_step_at;

        assert!(!engine.step_at(false, t0 + interval * 10), "not running");

        engine.set_running(true);
        let t0 = engine.last_step_at;
        assert!(!engine.step_at(false, t0 + interval / 2));
        assert!(engine.step_at(false, t0 + interval));
        assert_eq!(engine.generation(), 1);

        assert!(!engine.step_at(false, t0 + interval + interval / 2));
        assert!(engine.step_at(true, t0 + interval + interval / 2));
        // The forced step moved the reference point.
        assert!(!engine.step_at(false, t0 + interval * 2));
        assert!(engine.step_at(false, t0 + interval * 3));
        assert_eq!(engine.generation(), 3);
    }

    #[test]
    fn toggle_running_flips_state() {
        let mut engine = Wireworld::new();
        assert!(!engine.running());
        assert!(engine.toggle_running());
        assert!(engine.running());
        assert!(!engine.toggle_running());
    }

    #[test]
    fn interval_rounding_tiers() {
        assert_eq!(
            round_interval(Duration::from_millis(2_500)),
            Duration::from_secs(2)
        );
        assert_eq!(
            round_interval(Duration::from_micros(12_500)),
            Duration::from_millis(12)
        );
        assert_eq!(
            round_interval(Duration::from_nanos(62_500)),
            Duration::from_micros(62)
        );
    }

    #[test]
    fn scale_interval_halves_and_doubles() {
        assert_eq!(
            scaled_interval(Duration::from_millis(50), -1),
            Duration::from_millis(25)
        );
        assert_eq!(
            scaled_interval(Duration::from_millis(25), -1),
            Duration::from_millis(12)
        );
        assert_eq!(
            scaled_interval(Duration::from_millis(600), 1),
            Duration::from_secs(1)
        );
        assert_eq!(scaled_interval(Duration::MAX, 1), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn scale_interval_converges_to_floor() {
        let mut engine = Wireworld::with_config(
            WireworldConfig::default().step_interval(Duration::from_secs(3)),
        );
        for _ in 0..64 {
            engine.scale_interval(-1);
            assert!(engine.step_interval() >= MIN_STEP_INTERVAL);
        }
        assert_eq!(engine.step_interval(), MIN_STEP_INTERVAL);
        engine.scale_interval(-1);
        assert_eq!(engine.step_interval(), MIN_STEP_INTERVAL);
        engine.scale_interval(1);
        assert_eq!(engine.step_interval(), Duration::from_micros(2));
    }

    #[test]
    #[should_panic(expected = "delta must be -1 or +1")]
    fn scale_interval_rejects_other_deltas() {
        let mut engine = Wireworld::new();
        engine.scale_interval(2);
    }

    #[test]
    fn restore_removes_and_reinserts_exact_coordinates() {
        let mut engine = engine_with(&[0, 0, 1, 1, 0, 0, 2, 0, 1]);
        let before = CellStore::from_triples(&[1, 0, 0]);
        let after = CellStore::from_triples(&[1, 0, 2, 7, 7, 1]);

        engine.restore(&after, &before);
        assert_eq!(engine.get(1, 0), Some(CellState::Head));
        assert_eq!(engine.get(7, 7), Some(CellState::Wire));
        assert_eq!(engine.cell_count(), 4);

        engine.restore(&before, &after);
        assert_eq!(engine.get(1, 0), Some(CellState::Empty));
        assert_eq!(engine.get(7, 7), None);
        assert_eq!(engine.cell_count(), 3);
        assert!(engine.neighbors_stale());
        assert_buffers_in_lockstep(&engine);
    }

    #[test]
    fn translate_moves_selected_cells() {
        let mut engine = engine_with(&[0, 0, 1, 1, 0, 2, 5, 5, 1]);
        let selection = engine.cells().cells_in_area((0, 0), (1, 0));
        let moved = engine.translate(&selection, 0, 3);
        assert_eq!(moved.to_triples(), vec![0, 3, 1, 1, 3, 2]);
        assert_eq!(engine.get(0, 0), None);
        assert_eq!(engine.get(1, 3), Some(CellState::Head));
        assert_eq!(engine.cell_count(), 3);
        assert_buffers_in_lockstep(&engine);
    }
}
