//! Process-wide memoization for batched superclass queries.

use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Thread-safe LRU cache for superclass expansions.
///
/// A batched superclass query is a pure function of its input frontier, and
/// the hierarchy is treated as static for a run, so results are memoized for
/// the process lifetime with no invalidation. Keys are sorted frontier
/// snapshots, making them independent of set iteration order.
pub struct SuperclassCache {
    cache: Mutex<LruCache<String, HashSet<String>>>,
}

impl SuperclassCache {
    /// # Panics
    ///
    /// Panics if capacity is 0 (LRU cache requires non-zero capacity)
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).expect("Cache capacity must be at least 1");
        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    fn key(frontier: &[String]) -> String {
        let mut ids: Vec<&str> = frontier.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids.join("\u{1f}")
    }

    /// Memoized superclasses for a frontier, if previously computed.
    pub fn get(&self, frontier: &[String]) -> Option<HashSet<String>> {
        self.cache.lock().unwrap().get(&Self::key(frontier)).cloned()
    }

    /// Record the superclasses discovered for a frontier.
    pub fn put(&self, frontier: &[String], superclasses: HashSet<String>) {
        self.cache.lock().unwrap().put(Self::key(frontier), superclasses);
    }

    pub fn len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.cache.lock().unwrap().clear();
    }
}
