//! Open-addressed hash map.
//!
//! Linear probing over three-state slots (`Empty`, `Occupied`, `Tombstone`).
//! Lookup stops at the first `Empty`, skips tombstones, and returns on an
//! occupied slot with an equal key. Insertion reuses the first tombstone on
//! its probe path when the key is absent. Crossing the 70% load threshold
//! doubles the slot array and drops tombstones.
//!
//! Iteration order is slot order, not insertion order, and a resize may
//! reorder it.

use crate::value::{Value, hash_value, value_eq};

/// Capacity of the smallest table.
pub const MIN_CAPACITY: usize = 8;

/// Load-factor threshold, in percent, above which the table grows.
pub const LOAD_FACTOR_PCT: usize = 70;

#[derive(Debug)]
enum Slot {
    Empty,
    Tombstone,
    Occupied { key: Value, value: Value },
}

/// Hash table keyed by guest values. Keys outside `{Int, Float, Bool, Str,
/// Null}` all hash to 0 and degrade to a linear scan among themselves.
#[derive(Debug)]
pub struct Map {
    slots: Vec<Slot>,
    live: usize,
    tombstones: usize,
}

impl Default for Map {
    fn default() -> Self {
        Map::new()
    }
}

impl Map {
    pub fn new() -> Self {
        Map::with_capacity(MIN_CAPACITY)
    }

    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.max(MIN_CAPACITY);
        Map {
            slots: (0..cap).map(|_| Slot::Empty).collect(),
            live: 0,
            tombstones: 0,
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Probe for an occupied slot holding `key`. Stops on `Empty`, skips
    /// tombstones, and is bounded by one full sweep of the table.
    fn find_occupied(&self, key: &Value) -> Option<usize> {
        let cap = self.slots.len();
        let mut idx = (hash_value(key) as usize) % cap;
        for _ in 0..cap {
            match &self.slots[idx] {
                Slot::Empty => return None,
                Slot::Tombstone => {}
                Slot::Occupied { key: k, .. } => {
                    if value_eq(k, key) {
                        return Some(idx);
                    }
                }
            }
            idx = (idx + 1) % cap;
        }
        None
    }

    /// Place a key known to be absent: the first `Empty` or `Tombstone` on
    /// the probe path wins.
    fn place(&mut self, key: Value, value: Value) {
        let cap = self.slots.len();
        let mut idx = (hash_value(&key) as usize) % cap;
        for _ in 0..cap {
            match self.slots[idx] {
                Slot::Empty => {
                    self.slots[idx] = Slot::Occupied { key, value };
                    self.live += 1;
                    return;
                }
                Slot::Tombstone => {
                    self.slots[idx] = Slot::Occupied { key, value };
                    self.tombstones -= 1;
                    self.live += 1;
                    return;
                }
                Slot::Occupied { .. } => {}
            }
            idx = (idx + 1) % cap;
        }
        unreachable!("map::place called on a full table");
    }

    /// Rehash all occupied entries into a table of `new_cap` slots.
    /// Tombstones are dropped; iteration order may change.
    fn rehash(&mut self, new_cap: usize) {
        let old = std::mem::replace(
            &mut self.slots,
            (0..new_cap).map(|_| Slot::Empty).collect(),
        );
        self.live = 0;
        self.tombstones = 0;
        for slot in old {
            if let Slot::Occupied { key, value } = slot {
                self.place(key, value);
            }
        }
    }

    /// Insert or overwrite. An existing key keeps its slot; a new key grows
    /// the table first when it would cross the load threshold.
    pub fn set(&mut self, key: Value, value: Value) {
        if let Some(idx) = self.find_occupied(&key) {
            if let Slot::Occupied { value: v, .. } = &mut self.slots[idx] {
                *v = value;
            }
            return;
        }
        if (self.live + 1) * 100 > self.slots.len() * LOAD_FACTOR_PCT {
            self.rehash(self.slots.len() * 2);
        } else if self.live + self.tombstones == self.slots.len() {
            // Tombstone saturation: every slot is non-Empty and probes would
            // sweep the whole table. Flush at the same capacity.
            self.rehash(self.slots.len());
        }
        self.place(key, value);
    }

    /// `None` on miss; `has_key` distinguishes a missing key from a stored
    /// `Null`.
    pub fn get(&self, key: &Value) -> Option<Value> {
        self.find_occupied(key).map(|idx| match &self.slots[idx] {
            Slot::Occupied { value, .. } => value.clone(),
            _ => unreachable!(),
        })
    }

    pub fn has_key(&self, key: &Value) -> bool {
        self.find_occupied(key).is_some()
    }

    /// Mark the slot as a tombstone. Returns false on miss.
    pub fn delete(&mut self, key: &Value) -> bool {
        match self.find_occupied(key) {
            Some(idx) => {
                self.slots[idx] = Slot::Tombstone;
                self.live -= 1;
                self.tombstones += 1;
                true
            }
            None => false,
        }
    }

    /// Entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied { key, value } => Some((key, value)),
            _ => None,
        })
    }

    pub fn keys(&self) -> Vec<Value> {
        self.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.iter().map(|(_, v)| v.clone()).collect()
    }
}
