//! Bounded caches of unmatched per-slot items.
//!
//! The caches model a stream position rather than a general key-value store:
//! once a slot falls out, nothing at or below it is interesting anymore.
//! Without this, stale entries from long-past slots linger after a
//! disconnect/reconnect and can produce false matches.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use thiserror::Error;

/// Default capacity of a slot cache.
pub const MAX_CACHE_SIZE: usize = 1024;

/// Error returned for slots the cache does not hold.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The slot is absent, evicted, or was purged.
    #[error("Invalid slot: {0}")]
    InvalidSlot(u64),
}

/// A bounded `slot -> T` map with stream-position eviction.
///
/// When an insert pushes the map past capacity the smallest slot is evicted,
/// and with it everything at or below it (with an ordered map that is exactly
/// the first entry). [`SlotCache::remove`] applies the same drop-everything-
/// at-or-below semantics explicitly.
#[derive(Debug)]
pub struct SlotCache<T> {
    entries: Mutex<BTreeMap<u64, T>>,
    capacity: usize,
}

impl<T: Clone> SlotCache<T> {
    /// Creates a cache bounded to `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self { entries: Mutex::new(BTreeMap::new()), capacity: capacity.max(1) }
    }

    /// Inserts or replaces the entry for `slot`, evicting from the bottom
    /// once past capacity.
    pub fn put(&self, slot: u64, value: T) {
        let mut entries = self.entries.lock();
        entries.insert(slot, value);
        while entries.len() > self.capacity {
            entries.pop_first();
        }
    }

    /// Looks up `slot`.
    pub fn get(&self, slot: u64) -> Result<T, CacheError> {
        self.entries.lock().get(&slot).cloned().ok_or(CacheError::InvalidSlot(slot))
    }

    /// Drops every entry with key `<= slot`.
    pub fn remove(&self, slot: u64) {
        self.entries.lock().retain(|key, _| *key > slot);
    }

    /// Snapshot of the current entries in slot order.
    pub fn get_all(&self) -> Vec<(u64, T)> {
        self.entries.lock().iter().map(|(slot, value)| (*slot, value.clone())).collect()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<T: Clone> Default for SlotCache<T> {
    fn default() -> Self {
        Self::new(MAX_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get() {
        let cache = SlotCache::default();
        for slot in 0..100u64 {
            cache.put(slot, slot * 10);
            assert_eq!(cache.get(slot).unwrap(), slot * 10);
        }
    }

    #[test]
    fn eviction_drops_the_lowest_slots() {
        let cache = SlotCache::new(10);
        for slot in 0..100u64 {
            cache.put(slot, slot);
        }

        assert_eq!(cache.get(88), Err(CacheError::InvalidSlot(88)));
        assert_eq!(cache.get(90).unwrap(), 90);
        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn remove_purges_everything_at_or_below() {
        let cache = SlotCache::new(1 << 10);
        for slot in 0..100u64 {
            cache.put(slot, slot);
        }

        let removed = 57;
        cache.remove(removed);

        for slot in 0..=removed {
            assert_eq!(cache.get(slot), Err(CacheError::InvalidSlot(slot)));
        }
        for slot in (removed + 1)..100 {
            assert_eq!(cache.get(slot).unwrap(), slot);
        }
    }

    #[test]
    fn get_all_snapshots_in_slot_order() {
        let cache = SlotCache::new(1 << 10);
        for slot in (0..100u64).rev() {
            cache.put(slot, slot);
        }

        let all = cache.get_all();
        assert_eq!(all.len(), 100);
        assert!(all.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }
}
