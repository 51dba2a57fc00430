//! Cache Statistics Module
//!
//! Running hit/miss/eviction counters and the snapshot reported by
//! `TtlCache::stats`.

use serde::Serialize;

// == Counters ==
/// Running counters owned by the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheCounters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Counts both absent and expired lookups.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Counts capacity evictions only; lazy TTL removal is a miss.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}

// == Cache Stats ==
/// Point-in-time view of the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of stored entries, including stale ones not yet read
    pub size: usize,
    /// Stored keys in ascending order
    pub keys: Vec<String>,
    /// Default TTL in seconds
    pub ttl: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was looked up yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
