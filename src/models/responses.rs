//! Response DTOs for the pNode API
//!
//! Defines the JSON envelopes returned by every endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::node::{DataSource, NodeRecord};
use super::snapshot::Served;
use super::stats::AggregateStatistics;
use crate::cache::CacheStats;

/// Response body for `GET /pnodes`
#[derive(Debug, Clone, Serialize)]
pub struct NodesResponse {
    pub success: bool,
    pub cached: bool,
    pub source: DataSource,
    /// Producer of a cached payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<DataSource>,
    pub count: usize,
    pub data: Vec<NodeRecord>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<Served> for NodesResponse {
    fn from(served: Served) -> Self {
        let source = served.source();
        let origin = served.origin();
        let snapshot = served.snapshot;

        Self {
            success: true,
            cached: served.cached,
            source,
            origin,
            count: snapshot.nodes.len(),
            data: snapshot.nodes,
            timestamp: snapshot.timestamp,
            note: snapshot.note,
        }
    }
}

/// Response body for `GET /pnodes/:id`
#[derive(Debug, Clone, Serialize)]
pub struct NodeResponse {
    pub success: bool,
    pub cached: bool,
    pub source: DataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<DataSource>,
    pub data: NodeRecord,
    pub timestamp: DateTime<Utc>,
}

impl NodeResponse {
    /// Builds the envelope from a single-node snapshot; `None` if it is empty.
    pub fn from_served(served: Served) -> Option<Self> {
        let source = served.source();
        let origin = served.origin();
        let timestamp = served.snapshot.timestamp;
        let data = served.snapshot.nodes.into_iter().next()?;

        Some(Self {
            success: true,
            cached: served.cached,
            source,
            origin,
            data,
            timestamp,
        })
    }
}

/// Response body for `GET /pnodes/stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub source: DataSource,
    pub data: AggregateStatistics,
    pub timestamp: DateTime<Utc>,
}

impl StatsResponse {
    pub fn new(source: DataSource, data: AggregateStatistics) -> Self {
        Self {
            success: true,
            source,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always "OK" while the process serves requests
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub service: String,
    pub environment: String,
}

impl HealthResponse {
    pub fn ok(service: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            status: "OK".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            service: service.into(),
            environment: environment.into(),
        }
    }
}

/// Response body for `GET /cache/stats`
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub success: bool,
    pub data: CacheStats,
}

impl CacheStatsResponse {
    pub fn new(data: CacheStats) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Response body for `DELETE /cache` and `DELETE /cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct CacheEvictResponse {
    pub success: bool,
    /// Number of entries removed
    pub deleted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl CacheEvictResponse {
    pub fn cleared(deleted: usize) -> Self {
        Self {
            success: true,
            deleted,
            key: None,
        }
    }

    pub fn key(key: impl Into<String>, deleted: bool) -> Self {
        Self {
            success: true,
            deleted: usize::from(deleted),
            key: Some(key.into()),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    pub message: String,
    /// Requested path, set for unknown routes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}
