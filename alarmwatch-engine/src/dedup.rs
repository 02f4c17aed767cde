//! Bounded, insertion-ordered set of alarm keys already surfaced.

use std::collections::{HashSet, VecDeque};

use alarmwatch_types::AlarmKey;

/// Size above which the cache is pruned after a poll cycle.
pub const HIGH_WATER_MARK: usize = 2000;

/// Number of most recent keys kept when pruning.
pub const RETAIN_AFTER_PRUNE: usize = 1000;

/// Set of previously seen alarm keys.
///
/// Keys are remembered in insertion order so pruning can drop the oldest
/// ones. A pruned key that later reappears verbatim will be surfaced again;
/// that is the price of bounded memory in long sessions.
#[derive(Debug, Clone)]
pub struct DedupCache {
    keys: HashSet<AlarmKey>,
    order: VecDeque<AlarmKey>,
    high_water: usize,
    retain: usize,
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupCache {
    /// Create a cache with the default 2000/1000 bounds.
    pub fn new() -> Self {
        Self::with_bounds(HIGH_WATER_MARK, RETAIN_AFTER_PRUNE)
    }

    /// Create a cache with custom bounds. `retain` is capped at `high_water`.
    pub fn with_bounds(high_water: usize, retain: usize) -> Self {
        Self {
            keys: HashSet::new(),
            order: VecDeque::new(),
            high_water,
            retain: retain.min(high_water),
        }
    }

    /// Record a key. Returns `true` if it had not been seen before.
    pub fn insert(&mut self, key: AlarmKey) -> bool {
        if self.keys.contains(&key) {
            return false;
        }
        self.keys.insert(key.clone());
        self.order.push_back(key);
        true
    }

    pub fn contains(&self, key: &AlarmKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.order.clear();
    }

    /// If the cache has grown past its high-water mark, drop the oldest keys
    /// until only the most recent `retain` remain.
    ///
    /// Returns the number of keys evicted.
    pub fn prune(&mut self) -> usize {
        if self.order.len() <= self.high_water {
            return 0;
        }

        let excess = self.order.len() - self.retain;
        for key in self.order.drain(..excess) {
            self.keys.remove(&key);
        }
        excess
    }

    /// Keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &AlarmKey> {
        self.order.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(i: usize) -> AlarmKey {
        AlarmKey::from(format!("k{}", i))
    }

    #[test]
    fn test_insert_reports_new_keys() {
        let mut cache = DedupCache::new();
        assert!(cache.insert(key(1)));
        assert!(!cache.insert(key(1)));
        assert!(cache.insert(key(2)));
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&key(1)));
        assert!(!cache.contains(&key(3)));
    }

    #[test]
    fn test_clear() {
        let mut cache = DedupCache::new();
        cache.insert(key(1));
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.contains(&key(1)));
        // A cleared key is new again
        assert!(cache.insert(key(1)));
    }

    #[test]
    fn test_no_prune_at_high_water() {
        let mut cache = DedupCache::new();
        for i in 0..HIGH_WATER_MARK {
            cache.insert(key(i));
        }
        assert_eq!(cache.prune(), 0);
        assert_eq!(cache.len(), HIGH_WATER_MARK);
    }

    #[test]
    fn test_prune_keeps_most_recent() {
        let mut cache = DedupCache::new();
        for i in 0..=HIGH_WATER_MARK {
            cache.insert(key(i));
        }
        assert_eq!(cache.len(), 2001);

        let evicted = cache.prune();
        assert_eq!(evicted, 1001);
        assert_eq!(cache.len(), RETAIN_AFTER_PRUNE);

        // Oldest evicted, newest 1000 (1001..=2000) retained
        assert!(!cache.contains(&key(0)));
        assert!(!cache.contains(&key(1000)));
        assert!(cache.contains(&key(1001)));
        assert!(cache.contains(&key(2000)));
        assert_eq!(cache.iter().next(), Some(&key(1001)));
    }

    #[test]
    fn test_evicted_key_can_resurface() {
        let mut cache = DedupCache::with_bounds(4, 2);
        for i in 0..5 {
            cache.insert(key(i));
        }
        cache.prune();
        assert_eq!(cache.len(), 2);
        assert!(cache.insert(key(0)));
    }

    #[test]
    fn test_retain_capped_at_high_water() {
        let mut cache = DedupCache::with_bounds(3, 10);
        for i in 0..4 {
            cache.insert(key(i));
        }
        assert_eq!(cache.prune(), 1);
        assert_eq!(cache.len(), 3);
    }
}
