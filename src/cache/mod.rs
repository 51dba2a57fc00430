//! Cache Module
//!
//! In-memory TTL cache with lazy expiry and an optional LRU size bound.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use lru::LruTracker;
pub use stats::{CacheCounters, CacheStats};
pub use store::TtlCache;
