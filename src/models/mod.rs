//! Domain models and request/response DTOs for the pNode API

pub mod node;
pub mod requests;
pub mod responses;
pub mod snapshot;
pub mod stats;

// Re-export commonly used types
pub use node::{
    storage_violations, Coordinates, DataSource, Location, NodeRecord, NodeStatus, Storage,
    MOCK_MARKER, SOURCE_MARKER_KEY,
};
pub use requests::ListQuery;
pub use responses::{
    CacheEvictResponse, CacheStatsResponse, ErrorResponse, HealthResponse, NodeResponse,
    NodesResponse, StatsResponse,
};
pub use snapshot::{Served, Snapshot, MOCK_NOTE};
pub use stats::AggregateStatistics;
