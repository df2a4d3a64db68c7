//! Sorted sparse cell storage.
//!
//! A `CellStore` is a flat `Vec<Cell>` kept in (x, y) order so that lookups
//! are binary searches and stepping walks memory linearly. The same type is
//! used for the live simulation, the scratch buffer, patches fed to `load`
//! and history fragments.

use std::ops::Index;

use super::cell::{Cell, CellState};
use super::coord_set::CoordSet;
use super::error::PatternError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellStore {
    cells: Vec<Cell>,
}

impl CellStore {
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
        }
    }

    /// Wrap an existing record list as-is. The result is not sorted.
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Decode a trusted flat `(x, y, state)` sequence.
    ///
    /// # Panics
    /// If the length is not a multiple of 3 or a state is outside `0..=3`.
    /// Use [`CellStore::try_from_triples`] for input that is not built in.
    pub fn from_triples(triples: &[i32]) -> Self {
        match Self::try_from_triples(triples) {
            Ok(store) => store,
            Err(err) => panic!("malformed cell triples: {err}"),
        }
    }

    pub fn try_from_triples(triples: &[i32]) -> Result<Self, PatternError> {
        if triples.len() % 3 != 0 {
            return Err(PatternError::TruncatedTriples {
                len: triples.len(),
            });
        }
        let cells = triples
            .chunks_exact(3)
            .enumerate()
            .map(|(index, t)| {
                let state = CellState::try_from(t[2]).map_err(|err| match err {
                    PatternError::UnknownState(value) => {
                        PatternError::InvalidState { index, value }
                    }
                    other => other,
                })?;
                Ok(Cell::new(t[0], t[1], state))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { cells })
    }

    pub fn to_triples(&self) -> Vec<i32> {
        self.cells
            .iter()
            .flat_map(|c| [c.x, c.y, c.state.raw()])
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Append without any ordering or duplicate check.
    #[inline]
    pub fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    /// Insert at the ordered position. Precondition: sorted, coordinate absent.
    pub(crate) fn insert_sorted(&mut self, cell: Cell) {
        let at = self
            .cells
            .partition_point(|c| c.cmp_position(&cell).is_lt());
        debug_assert!(
            self.cells
                .get(at)
                .is_none_or(|c| c.cmp_position(&cell).is_ne()),
            "insert_sorted received an existing coordinate"
        );
        self.cells.insert(at, cell);
    }

    /// Grow or shrink to `len` records, padding with empty cells at the origin.
    pub(crate) fn resize(&mut self, len: usize) {
        self.cells.resize(len, Cell::default());
    }

    pub fn sort(&mut self) {
        self.cells.sort_unstable_by(Cell::cmp_position);
    }

    pub fn is_sorted(&self) -> bool {
        self.cells
            .windows(2)
            .all(|w| w[0].cmp_position(&w[1]).is_le())
    }

    /// Binary search for the record at (x, y). Precondition: sorted.
    #[inline]
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        self.cells.binary_search_by(|c| c.cmp_coord(x, y)).ok()
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index_of(x, y).is_some()
    }

    /// State at (x, y), if a record exists. Precondition: sorted.
    #[inline]
    pub fn state_at(&self, x: i32, y: i32) -> Option<CellState> {
        self.index_of(x, y).map(|i| self.cells[i].state)
    }

    /// A new store without Empty records, relative order preserved.
    pub fn trim(&self) -> CellStore {
        let mut cells = Vec::with_capacity(self.cells.len());
        cells.extend(self.cells.iter().filter(|c| !c.state.is_empty()));
        Self { cells }
    }

    /// Merge `patch`, offset by (x, y), into this store.
    ///
    /// Existing coordinates are overwritten in place, new ones are appended.
    /// Patch values win, including over earlier records of the same patch.
    /// The result is not re-sorted. Precondition: sorted.
    pub fn load(&mut self, x: i32, y: i32, patch: &CellStore) {
        let sorted_len = self.cells.len();
        let mut appended = CoordSet::with_capacity(patch.len());

        for cell in &patch.cells {
            let cx = cell.x.wrapping_add(x);
            let cy = cell.y.wrapping_add(y);

            let existing = self.cells[..sorted_len]
                .binary_search_by(|c| c.cmp_coord(cx, cy))
                .ok()
                .or_else(|| appended.get(cx, cy).map(|i| i as usize));

            match existing {
                Some(i) => self.cells[i].state = cell.state,
                None => {
                    appended.insert_value(cx, cy, self.cells.len() as u32);
                    self.cells.push(Cell::new(cx, cy, cell.state));
                }
            }
        }
    }

    /// Remove every coordinate of `patch` from the store, then trim.
    /// Precondition: sorted.
    pub fn unload(&mut self, patch: &CellStore) {
        for cell in &patch.cells {
            if let Some(i) = self.index_of(cell.x, cell.y) {
                self.cells[i].state = CellState::Empty;
            }
        }
        *self = self.trim();
    }

    /// Drop exactly the records at the coordinates of `coords`, leaving
    /// everything else (Empty records included) in place.
    pub fn remove(&mut self, coords: &CellStore) {
        if coords.is_empty() {
            return;
        }
        let doomed = CoordSet::from_coords(coords.iter().map(Cell::coord));
        self.cells.retain(|c| !doomed.contains(c.x, c.y));
    }

    /// The sorted fragment of records present at the coordinates of `coords`.
    /// Precondition: sorted.
    pub fn capture(&self, coords: &CellStore) -> CellStore {
        let mut seen = CoordSet::with_capacity(coords.len());
        let mut cells = Vec::with_capacity(coords.len());
        for c in &coords.cells {
            if !seen.insert(c.x, c.y) {
                continue;
            }
            if let Some(i) = self.index_of(c.x, c.y) {
                cells.push(self.cells[i]);
            }
        }
        let mut fragment = Self { cells };
        fragment.sort();
        fragment
    }

    /// Records inside the inclusive rectangle `min..=max`. Precondition: sorted.
    pub fn cells_in_area(&self, min: (i32, i32), max: (i32, i32)) -> CellStore {
        let (x0, x1) = (min.0.min(max.0), min.0.max(max.0));
        let (y0, y1) = (min.1.min(max.1), min.1.max(max.1));
        let start = self.cells.partition_point(|c| c.x < x0);
        let end = self.cells.partition_point(|c| c.x <= x1);
        let cells = self.cells[start..end.max(start)]
            .iter()
            .filter(|c| c.y >= y0 && c.y <= y1)
            .copied()
            .collect();
        Self { cells }
    }

    /// `(min_x, min_y, max_x, max_y)` over all records.
    pub fn bounds(&self) -> Option<(i32, i32, i32, i32)> {
        let first = self.cells.first()?;
        let init = (first.x, first.y, first.x, first.y);
        Some(self.cells.iter().fold(init, |(x0, y0, x1, y1), c| {
            (x0.min(c.x), y0.min(c.y), x1.max(c.x), y1.max(c.y))
        }))
    }

    pub fn translated(&self, dx: i32, dy: i32) -> CellStore {
        let cells = self
            .cells
            .iter()
            .map(|c| Cell::new(c.x.wrapping_add(dx), c.y.wrapping_add(dy), c.state))
            .collect();
        Self { cells }
    }

    /// Shift so that the smallest x and the smallest y become 0.
    pub fn anchored(&self) -> CellStore {
        match self.bounds() {
            Some((min_x, min_y, _, _)) => {
                self.translated(min_x.wrapping_neg(), min_y.wrapping_neg())
            }
            None => Self::new(),
        }
    }

    /// Number of records per state, indexed by `CellState::index`.
    pub fn census(&self) -> [usize; 4] {
        let mut counts = [0usize; 4];
        for c in &self.cells {
            counts[c.state.index()] += 1;
        }
        counts
    }
}

impl Index<usize> for CellStore {
    type Output = Cell;

    #[inline]
    fn index(&self, index: usize) -> &Cell {
        &self.cells[index]
    }
}

impl FromIterator<Cell> for CellStore {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CellStore {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::CellStore;
    use crate::wireworld::{Cell, CellState, PatternError};

    fn store(triples: &[i32]) -> CellStore {
        let mut s = CellStore::from_triples(triples);
        s.sort();
        s
    }

    fn has_duplicates(s: &CellStore) -> bool {
        s.as_slice()
            .windows(2)
            .any(|w| w[0].cmp_position(&w[1]).is_eq())
    }

    #[test]
    fn index_of_finds_every_record_and_rejects_gaps() {
        let s = store(&[5, 1, 1, -2, 0, 2, 5, -1, 3, 0, 0, 1]);
        assert!(s.is_sorted());
        for (i, c) in s.iter().enumerate() {
            assert_eq!(s.index_of(c.x, c.y), Some(i));
        }
        assert_eq!(s.index_of(5, 0), None);
        assert_eq!(s.index_of(-3, 0), None);
        assert_eq!(s.index_of(6, 0), None);
        assert!(CellStore::new().index_of(0, 0).is_none());
    }

    #[test]
    fn trim_drops_empty_records_and_keeps_order() {
        let s = store(&[0, 0, 1, 0, 1, 0, 1, 0, 2, 2, 2, 0, 3, 3, 3]);
        let t = s.trim();
        assert_eq!(t.to_triples(), vec![0, 0, 1, 1, 0, 2, 3, 3, 3]);
        assert_eq!(s.len(), 5, "trim returns a new store");
    }

    #[test]
    fn load_overwrites_existing_and_appends_new() {
        let mut s = store(&[0, 0, 1, 1, 0, 1]);
        let patch = CellStore::from_triples(&[0, 0, 2, 1, 0, 3]);
        s.load(1, 0, &patch);
        // (1,0) overwritten with Head, (2,0) appended as Tail.
        assert_eq!(s.len(), 3);
        assert_eq!(s[1].state, CellState::Head);
        assert_eq!(s[2], Cell::new(2, 0, CellState::Tail));
        s.sort();
        assert!(!has_duplicates(&s));
    }

    #[test]
    fn load_twice_with_overlap_keeps_later_values() {
        let mut s = CellStore::new();
        s.load(0, 0, &CellStore::from_triples(&[0, 0, 1, 1, 0, 1, 2, 0, 1]));
        s.sort();
        s.load(1, 0, &CellStore::from_triples(&[0, 0, 2, 1, 0, 3, 2, 0, 2]));
        s.sort();
        assert!(!has_duplicates(&s));
        assert_eq!(
            s.to_triples(),
            vec![0, 0, 1, 1, 0, 2, 2, 0, 3, 3, 0, 2]
        );
    }

    #[test]
    fn load_dedups_repeated_patch_coordinates() {
        let mut s = CellStore::new();
        s.load(0, 0, &CellStore::from_triples(&[4, 4, 1, 4, 4, 2, 4, 4, 3]));
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].state, CellState::Tail);
    }

    #[test]
    fn unload_removes_coordinates_and_trims() {
        let mut s = store(&[0, 0, 1, 1, 0, 1, 2, 0, 1]);
        let patch = CellStore::from_triples(&[3, 3, 1, 1, 1, 1]);
        s.load(0, 0, &patch);
        s.sort();
        assert_eq!(s.len(), 5);
        s.unload(&patch);
        assert_eq!(s.len(), 3);
        assert!(!s.contains(3, 3));
        assert!(!s.contains(1, 1));
        // Unknown coordinates are ignored.
        s.unload(&CellStore::from_triples(&[99, 99, 1]));
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn remove_only_touches_listed_coordinates() {
        let mut s = store(&[0, 0, 0, 1, 0, 1, 2, 0, 2]);
        s.remove(&CellStore::from_triples(&[1, 0, 0, 7, 7, 0]));
        assert_eq!(s.to_triples(), vec![0, 0, 0, 2, 0, 2]);
    }

    #[test]
    fn capture_returns_present_records_only() {
        let s = store(&[0, 0, 1, 1, 0, 2, 2, 0, 0]);
        let coords = CellStore::from_triples(&[2, 0, 1, 9, 9, 1, 0, 0, 3, 0, 0, 3]);
        let fragment = s.capture(&coords);
        assert_eq!(fragment.to_triples(), vec![0, 0, 1, 2, 0, 0]);
    }

    #[test]
    fn cells_in_area_is_inclusive_and_order_agnostic() {
        let s = store(&[0, 0, 1, 1, 1, 1, 2, 2, 1, 3, 3, 1, 1, 5, 1]);
        let area = s.cells_in_area((2, 2), (1, 1));
        assert_eq!(area.to_triples(), vec![1, 1, 1, 2, 2, 1]);
        assert!(s.cells_in_area((10, 10), (12, 12)).is_empty());
    }

    #[test]
    fn anchored_moves_minimum_corner_to_origin() {
        let s = store(&[5, 7, 1, 6, 9, 2]);
        assert_eq!(s.bounds(), Some((5, 7, 6, 9)));
        let a = s.anchored();
        assert_eq!(a.to_triples(), vec![0, 0, 1, 1, 2, 2]);
        assert_eq!(CellStore::new().bounds(), None);
    }

    #[test]
    fn try_from_triples_reports_malformed_input() {
        assert_eq!(
            CellStore::try_from_triples(&[1, 2]),
            Err(PatternError::TruncatedTriples { len: 2 })
        );
        assert_eq!(
            CellStore::try_from_triples(&[0, 0, 1, 1, 1, 9]),
            Err(PatternError::InvalidState { index: 1, value: 9 })
        );
    }

    #[test]
    #[should_panic(expected = "malformed cell triples")]
    fn from_triples_panics_on_contract_violation() {
        let _ = CellStore::from_triples(&[0, 0, 1, 0]);
    }

    #[test]
    fn insert_sorted_keeps_order() {
        let mut s = store(&[0, 0, 1, 2, 0, 1]);
        s.insert_sorted(Cell::new(1, 5, CellState::Wire));
        s.insert_sorted(Cell::new(-1, 0, CellState::Wire));
        s.insert_sorted(Cell::new(3, 0, CellState::Wire));
        assert!(s.is_sorted());
        assert_eq!(s.len(), 5);
    }

    #[test]
    fn census_counts_each_state() {
        let s = store(&[0, 0, 0, 1, 0, 1, 2, 0, 1, 3, 0, 2, 4, 0, 3]);
        assert_eq!(s.census(), [1, 2, 1, 1]);
    }
}
