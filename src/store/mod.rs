//! Persisted Store Module
//!
//! The system of record for node data, behind the [`NodeStore`] trait.
//!
//! # Implementations
//! - [`MemoryNodeStore`]: process-lifetime map, used when no path is configured
//! - [`JsonFileNodeStore`]: the same map mirrored to a JSON file on every write

mod file;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::NodeRecord;

pub use file::JsonFileNodeStore;
pub use memory::MemoryNodeStore;

// == Persistence Error ==
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("store I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store contents are not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

// == Node Store Trait ==
/// Upsert/find contract consumed by the orchestrator.
///
/// `upsert` is idempotent and last-write-wins: writing the same record twice
/// leaves the same state as writing it once.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Inserts or replaces the record stored under `id` and returns what was
    /// stored. The stored record's `id` is always `id`.
    async fn upsert(&self, id: &str, record: NodeRecord) -> Result<NodeRecord, PersistenceError>;

    /// Returns every stored record in ascending id order.
    async fn find_all(&self) -> Result<Vec<NodeRecord>, PersistenceError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<NodeRecord>, PersistenceError>;
}

/// Shared handle used by the service and background tasks.
pub type SharedStore = Arc<dyn NodeStore>;
