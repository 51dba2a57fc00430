//! Node Record Model
//!
//! Canonical shape of one monitored pNode, shared by every data source.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key carrying the origin marker of a record.
pub const SOURCE_MARKER_KEY: &str = "source";

/// Marker value stamped on synthetic records.
pub const MOCK_MARKER: &str = "mock";

/// Placeholder for missing location fields.
pub const UNKNOWN_LOCATION: &str = "Unknown";

// == Node Status ==
/// Coarse liveness classification reported by gossip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Active,
    Gossiping,
    Offline,
    #[default]
    Unknown,
}

impl NodeStatus {
    /// Parses a status string case-insensitively; unrecognised input is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "gossiping" => Self::Gossiping,
            "offline" => Self::Offline,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Gossiping => "gossiping",
            Self::Offline => "offline",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Storage ==
/// Storage capacity in bytes. `used + available == total` always holds for
/// values built through [`Storage::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Storage {
    pub used: u64,
    pub total: u64,
    pub available: u64,
}

impl Storage {
    /// Builds a consistent storage block, deriving `available`.
    ///
    /// `used` is clamped to `total`.
    pub fn new(used: u64, total: u64) -> Self {
        let used = used.min(total);
        Self {
            used,
            total,
            available: total - used,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.used.checked_add(self.available) == Some(self.total)
    }
}

// == Location ==
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub country: String,
    pub region: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            country: UNKNOWN_LOCATION.to_string(),
            region: UNKNOWN_LOCATION.to_string(),
            city: UNKNOWN_LOCATION.to_string(),
            coordinates: None,
        }
    }
}

// == Node Record ==
/// One monitored network participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Unique identifier, the upsert key
    pub id: String,
    #[serde(alias = "gossipStatus")]
    pub status: NodeStatus,
    pub storage: Storage,
    pub location: Location,
    /// Uptime in seconds
    pub uptime: u64,
    pub version: String,
    pub last_seen: DateTime<Utc>,
    /// Open map: ip, port, latency, hardware hints, origin marker
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl NodeRecord {
    /// True for records produced by the mock generator.
    pub fn is_mock(&self) -> bool {
        self.metadata.get(SOURCE_MARKER_KEY).and_then(Value::as_str) == Some(MOCK_MARKER)
    }

    /// Latency in milliseconds when the record carries a numeric one.
    pub fn latency_ms(&self) -> Option<f64> {
        self.metadata.get("latency").and_then(Value::as_f64)
    }
}

/// Returns the ids of records whose storage block breaks `used + available == total`.
pub fn storage_violations(records: &[NodeRecord]) -> Vec<&str> {
    records
        .iter()
        .filter(|record| !record.storage.is_consistent())
        .map(|record| record.id.as_str())
        .collect()
}

// == Data Source ==
/// Where a response payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Cache,
    Upstream,
    Database,
    Mock,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Upstream => "upstream",
            Self::Database => "database",
            Self::Mock => "mock",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
