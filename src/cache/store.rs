//! TTL Cache Store Module
//!
//! Key-value map with per-entry expiry, checked lazily on read, and an
//! optional LRU size bound.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheCounters, CacheEntry, CacheStats, LruTracker};

// == TTL Cache ==
/// In-memory cache with lazy TTL expiry.
///
/// There is no background sweep: a stale entry stays in the map until the
/// next `get` for its key removes it. Without a size bound the map grows with
/// the number of distinct keys, which stays small for this service.
#[derive(Debug)]
pub struct TtlCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Recency order used by the size bound
    lru: LruTracker,
    counters: CacheCounters,
    /// Optional capacity; `None` means unbounded
    max_entries: Option<usize>,
    /// TTL applied when `set` is called without one
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    // == Constructor ==
    /// Creates an unbounded cache.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            counters: CacheCounters::default(),
            max_entries: None,
            default_ttl,
        }
    }

    /// Creates a cache that evicts the least recently used key once it holds
    /// `max_entries` keys. A bound of zero is treated as one.
    pub fn bounded(default_ttl: Duration, max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries.max(1)),
            ..Self::new(default_ttl)
        }
    }

    // == Set ==
    /// Stores `value` under `key`, expiring `ttl` (or the default TTL) from
    /// now. Overwriting a key resets its expiry.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let ttl = ttl.unwrap_or(self.default_ttl);

        if let Some(limit) = self.max_entries {
            if !self.entries.contains_key(&key) && self.entries.len() >= limit {
                self.evict_least_recent();
            }
        }

        self.entries.insert(key.clone(), CacheEntry::new(value, ttl));
        self.lru.touch(&key);
        debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "cache set");
    }

    // == Get ==
    /// Returns a clone of the live value for `key`.
    ///
    /// A stale entry is removed and reported as absent. Reads never extend
    /// an entry's lifetime.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.counters.record_miss();
                debug!(key = %key, "cache miss");
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.lru.remove(key);
            self.counters.record_miss();
            debug!(key = %key, "cache entry expired");
            return None;
        }

        self.counters.record_hit();
        self.lru.touch(key);
        debug!(key = %key, "cache hit");
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Delete ==
    /// Removes `key`, returning whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }

    // == Clear ==
    /// Drops every entry and returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        removed
    }

    // == Stats ==
    /// Returns size, keys, default TTL and the running counters.
    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();

        CacheStats {
            size: self.entries.len(),
            keys,
            ttl: self.default_ttl.as_secs(),
            hits: self.counters.hits,
            misses: self.counters.misses,
            evictions: self.counters.evictions,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_least_recent(&mut self) {
        if let Some(victim) = self.lru.pop_least_recent() {
            self.entries.remove(&victim);
            self.counters.record_eviction();
            debug!(key = %victim, "cache evicted least recently used entry");
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const TTL: Duration = Duration::from_secs(30);

    #[test]
    fn test_cache_new() {
        let cache: TtlCache<String> = TtlCache::new(TTL);
        assert!(cache.is_empty());
        assert_eq!(cache.default_ttl(), TTL);
    }

    #[test]
    fn test_set_and_get() {
        let mut cache = TtlCache::new(TTL);
        cache.set("all_pnodes", vec![1, 2, 3], None);

        assert_eq!(cache.get("all_pnodes"), Some(vec![1, 2, 3]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_missing_key() {
        let mut cache: TtlCache<u8> = TtlCache::new(TTL);
        assert_eq!(cache.get("nope"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let mut cache = TtlCache::new(TTL);
        cache.set("short", "value", Some(Duration::from_millis(40)));

        assert_eq!(cache.get("short"), Some("value"));
        sleep(Duration::from_millis(70));

        assert_eq!(cache.get("short"), None);
        assert!(cache.is_empty(), "stale entry should be removed by the read");
    }

    #[test]
    fn test_stale_entry_lingers_until_read() {
        let mut cache = TtlCache::new(TTL);
        cache.set("short", 1u8, Some(Duration::from_millis(10)));
        sleep(Duration::from_millis(30));

        assert_eq!(cache.stats().size, 1);
        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_get_does_not_extend_lifetime() {
        let mut cache = TtlCache::new(TTL);
        cache.set("k", 7u8, Some(Duration::from_millis(300)));

        sleep(Duration::from_millis(180));
        assert_eq!(cache.get("k"), Some(7));
        sleep(Duration::from_millis(180));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_overwrite_resets_value() {
        let mut cache = TtlCache::new(TTL);
        cache.set("k", "v1", None);
        cache.set("k", "v2", None);

        assert_eq!(cache.get("k"), Some("v2"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_delete() {
        let mut cache = TtlCache::new(TTL);
        cache.set("k", 1u8, None);

        assert!(cache.delete("k"));
        assert!(!cache.delete("k"));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_clear() {
        let mut cache = TtlCache::new(TTL);
        cache.set("a", 1u8, None);
        cache.set("b", 2u8, None);

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert!(cache.stats().keys.is_empty());
    }

    #[test]
    fn test_stats_report_size_keys_and_ttl() {
        let mut cache = TtlCache::new(TTL);
        cache.set("pnode_b", 1u8, None);
        cache.set("pnode_a", 2u8, None);
        cache.get("pnode_a");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.keys, vec!["pnode_a", "pnode_b"]);
        assert_eq!(stats.ttl, 30);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_unbounded_cache_never_evicts() {
        let mut cache = TtlCache::new(TTL);
        for i in 0..500 {
            cache.set(format!("k{i}"), i, None);
        }

        assert_eq!(cache.len(), 500);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_bounded_cache_evicts_least_recent() {
        let mut cache = TtlCache::bounded(TTL, 3);
        cache.set("k1", 1, None);
        cache.set("k2", 2, None);
        cache.set("k3", 3, None);

        cache.get("k1");
        cache.set("k4", 4, None);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("k2"), None);
        assert_eq!(cache.get("k1"), Some(1));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_bounded_overwrite_does_not_evict() {
        let mut cache = TtlCache::bounded(TTL, 2);
        cache.set("k1", 1, None);
        cache.set("k2", 2, None);
        cache.set("k1", 10, None);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
    }
}
