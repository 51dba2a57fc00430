//! Snapshot Model
//!
//! The unit the orchestrator caches and returns: a node set plus the source
//! that produced it.

use chrono::{DateTime, Utc};

use super::node::{DataSource, NodeRecord};

/// Note attached to payloads produced by the mock generator.
pub const MOCK_NOTE: &str = "Mock data - upstream unavailable";

// == Snapshot ==
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Source that produced the nodes; never `Cache`
    pub source: DataSource,
    pub nodes: Vec<NodeRecord>,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

impl Snapshot {
    pub fn new(source: DataSource, nodes: Vec<NodeRecord>) -> Self {
        let note = (source == DataSource::Mock).then(|| MOCK_NOTE.to_string());
        Self {
            source,
            nodes,
            timestamp: Utc::now(),
            note,
        }
    }
}

// == Served ==
/// A snapshot together with whether it was answered from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Served {
    pub snapshot: Snapshot,
    pub cached: bool,
}

impl Served {
    pub fn fresh(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            cached: false,
        }
    }

    pub fn from_cache(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            cached: true,
        }
    }

    /// Source reported to the caller: `cache` on a hit, the producer otherwise.
    pub fn source(&self) -> DataSource {
        if self.cached {
            DataSource::Cache
        } else {
            self.snapshot.source
        }
    }

    /// Producer of a cached snapshot, so a cache hit on mock data still says so.
    pub fn origin(&self) -> Option<DataSource> {
        self.cached.then_some(self.snapshot.source)
    }
}
