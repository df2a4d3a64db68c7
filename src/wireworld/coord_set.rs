//! Reusable coordinate index for edit-time deduplication.
//!
//! This is an open-addressed linear-probing hash map from `(i32, i32)` keys to
//! a `u32` payload (usually a store index). Slots are lazily cleared with an
//! epoch stamp, so each edit can start a fresh index without touching the
//! full backing array.

const LOAD_NUM: usize = 3;
const LOAD_DEN: usize = 4;

#[derive(Clone, Copy)]
#[repr(C)]
struct Slot {
    x: i32,
    y: i32,
    value: u32,
    stamp: u32,
}

impl Slot {
    const EMPTY: Self = Self {
        x: 0,
        y: 0,
        value: 0,
        stamp: 0,
    };
}

#[inline(always)]
fn coord_hash(x: i32, y: i32) -> u64 {
    const MX: u64 = 0x517c_c1b7_2722_0a95;
    const MY: u64 = 0x6c62_272e_07bb_0142;
    let hx = (x as i64 as u64).wrapping_mul(MX);
    let hy = (y as i64 as u64).wrapping_mul(MY);
    let h = hx ^ hy.rotate_right(32);
    h ^ (h >> 29)
}

#[inline]
fn slots_for(keys: usize) -> usize {
    keys.saturating_mul(LOAD_DEN)
        .div_ceil(LOAD_NUM)
        .next_power_of_two()
        .max(16)
}

pub struct CoordSet {
    slots: Vec<Slot>,
    mask: usize,
    stamp: u32,
    len: usize,
}

impl Default for CoordSet {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordSet {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(cap: usize) -> Self {
        let slots = slots_for(cap);
        Self {
            slots: vec![Slot::EMPTY; slots],
            mask: slots - 1,
            stamp: 1,
            len: 0,
        }
    }

    /// Build an index over the coordinates of `cells`, mapping each to its
    /// position. Later duplicates overwrite earlier ones.
    pub fn from_coords<I>(coords: I) -> Self
    where
        I: IntoIterator<Item = (i32, i32)>,
        I::IntoIter: ExactSizeIterator,
    {
        let coords = coords.into_iter();
        let mut set = Self::with_capacity(coords.len());
        for (i, (x, y)) in coords.enumerate() {
            set.insert_value(x, y, i as u32);
        }
        set
    }

    /// Forget every key in O(1).
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.stamp = 1;
            for slot in &mut self.slots {
                slot.stamp = 0;
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn reserve_for(&mut self, keys: usize) {
        if keys == 0 {
            return;
        }
        let needed = slots_for(self.len.saturating_add(keys));
        if needed > self.slots.len() {
            self.resize(needed);
        }
    }

    #[inline(always)]
    fn needs_grow(&self) -> bool {
        (self.len + 1) * LOAD_DEN >= self.slots.len() * LOAD_NUM
    }

    fn resize(&mut self, new_slots: usize) {
        debug_assert!(new_slots.is_power_of_two());
        let old_slots = std::mem::replace(&mut self.slots, vec![Slot::EMPTY; new_slots]);
        self.mask = new_slots - 1;
        self.len = 0;

        for slot in old_slots {
            if slot.stamp == self.stamp {
                self.insert_rehash(slot);
            }
        }
    }

    #[inline(always)]
    fn insert_rehash(&mut self, entry: Slot) {
        let mut pos = coord_hash(entry.x, entry.y) as usize & self.mask;
        loop {
            let slot = &mut self.slots[pos];
            if slot.stamp != self.stamp {
                *slot = entry;
                self.len += 1;
                return;
            }
            pos = (pos + 1) & self.mask;
        }
    }

    #[inline]
    fn find(&self, x: i32, y: i32) -> Option<usize> {
        let mut pos = coord_hash(x, y) as usize & self.mask;
        loop {
            let slot = &self.slots[pos];
            if slot.stamp != self.stamp {
                return None;
            }
            if slot.x == x && slot.y == y {
                return Some(pos);
            }
            pos = (pos + 1) & self.mask;
        }
    }

    /// Insert or overwrite the payload for a coordinate.
    /// Returns the previous payload if the coordinate was already present.
    pub fn insert_value(&mut self, x: i32, y: i32, value: u32) -> Option<u32> {
        if self.needs_grow() {
            self.resize(self.slots.len() * 2);
        }

        let mut pos = coord_hash(x, y) as usize & self.mask;
        loop {
            let stamp = self.stamp;
            let slot = &mut self.slots[pos];
            if slot.stamp != stamp {
                *slot = Slot { x, y, value, stamp };
                self.len += 1;
                return None;
            }
            if slot.x == x && slot.y == y {
                return Some(std::mem::replace(&mut slot.value, value));
            }
            pos = (pos + 1) & self.mask;
        }
    }

    /// Insert a coordinate.
    /// Returns `true` if newly inserted, `false` if it already existed.
    #[inline]
    pub fn insert(&mut self, x: i32, y: i32) -> bool {
        if self.contains(x, y) {
            return false;
        }
        self.insert_value(x, y, 0);
        true
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        self.find(x, y).map(|pos| self.slots[pos].value)
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.find(x, y).is_some()
    }
}
