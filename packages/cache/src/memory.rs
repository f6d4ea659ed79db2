//! Byte-bounded, least-recently-used memory tier.

use std::collections::{BTreeMap, HashMap};

use apicache_core::Value;

struct MemoryEntry {
    payload: Value,
    size: u64,
    tick: u64,
}

/// In-memory records bounded by the sum of their `Value::size_bytes`.
///
/// Reads and writes both refresh recency. Inserting evicts the least
/// recently used records until the newcomer fits; a payload larger than the
/// whole budget is never admitted.
pub struct MemoryTier {
    limit: u64,
    used: u64,
    next_tick: u64,
    entries: HashMap<String, MemoryEntry>,
    // tick -> key, oldest first
    recency: BTreeMap<u64, String>,
}

impl MemoryTier {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            used: 0,
            next_tick: 0,
            entries: HashMap::new(),
            recency: BTreeMap::new(),
        }
    }

    pub fn used_bytes(&self) -> u64 {
        self.used
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Clone out a payload and mark it most recently used.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let tick = self.bump();
        let entry = self.entries.get_mut(key)?;
        self.recency.remove(&entry.tick);
        entry.tick = tick;
        self.recency.insert(tick, key.to_string());
        Some(entry.payload.clone())
    }

    /// Store a payload, returning whether it was admitted.
    ///
    /// Any previous copy of `key` is dropped first, even when the new
    /// payload does not fit, so the tier never serves a superseded value.
    pub fn insert(&mut self, key: &str, payload: Value) -> bool {
        self.remove(key);

        let size = payload.size_bytes();
        if size > self.limit {
            return false;
        }

        while self.used + size > self.limit {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            if let Some(evicted) = self.entries.remove(&oldest) {
                self.used -= evicted.size;
                tracing::trace!(key = %oldest, size = evicted.size, "evicted from memory tier");
            }
        }

        let tick = self.bump();
        self.recency.insert(tick, key.to_string());
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                payload,
                size,
                tick,
            },
        );
        self.used += size;
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.tick);
        self.used -= entry.size;
        Some(entry.payload)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.used = 0;
    }

    fn bump(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }
}
