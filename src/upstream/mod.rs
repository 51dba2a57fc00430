//! Upstream Module
//!
//! Access to the external network-status API behind the [`Upstream`] trait.

mod client;
mod error;
pub mod normalize;

use async_trait::async_trait;

use crate::models::NodeRecord;

pub use client::UpstreamClient;
pub use error::{FetchError, FetchErrorKind};

/// Source of live node data.
///
/// Implementations return canonical records only; raw upstream shapes never
/// cross this boundary.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Fetches every node the network currently reports.
    async fn fetch_all_nodes(&self) -> Result<Vec<NodeRecord>, FetchError>;

    /// Fetches a single node.
    async fn fetch_node_by_id(&self, id: &str) -> Result<NodeRecord, FetchError>;
}
