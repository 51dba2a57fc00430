//! Fallback Orchestrator
//!
//! Answers node queries from the first source that has data:
//!
//! ```text
//! CACHE_CHECK -> UPSTREAM_ATTEMPT -> STORE_FALLBACK -> MOCK_FALLBACK -> RESPOND
//! ```
//!
//! Upstream data always wins over persisted data, and persisted data always
//! wins over mock data. Whatever source answers, the result is written back
//! to the cache before it is returned.

mod policy;

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::mock::MockGenerator;
use crate::models::{
    storage_violations, AggregateStatistics, DataSource, NodeRecord, Served, Snapshot,
};
use crate::store::SharedStore;
use crate::upstream::{FetchError, FetchErrorKind, Upstream};

pub use policy::FallbackPolicy;

/// Cache key of the "all nodes" snapshot.
pub const ALL_NODES_KEY: &str = "all_pnodes";

/// Cache key of a single-node snapshot.
pub fn node_cache_key(id: &str) -> String {
    format!("pnode_{id}")
}

/// Cache shared by request handlers and the refresh task.
pub type SharedCache = Arc<RwLock<TtlCache<Snapshot>>>;

// == Node Service ==
/// Owns the cache, the upstream client, the store and the mock generator,
/// and runs the fallback chain for every query.
pub struct NodeService {
    cache: SharedCache,
    upstream: Arc<dyn Upstream>,
    store: SharedStore,
    mock: Mutex<MockGenerator>,
    policy: FallbackPolicy,
}

impl NodeService {
    pub fn new(
        cache: SharedCache,
        upstream: Arc<dyn Upstream>,
        store: SharedStore,
        mock: MockGenerator,
        policy: FallbackPolicy,
    ) -> Self {
        Self {
            cache,
            upstream,
            store,
            mock: Mutex::new(mock),
            policy,
        }
    }

    /// Builds the service with a fresh cache and generator sized from `config`.
    pub fn from_config(config: &Config, upstream: Arc<dyn Upstream>, store: SharedStore) -> Self {
        let cache = match config.cache_max_entries {
            Some(limit) => TtlCache::bounded(config.cache_ttl, limit),
            None => TtlCache::new(config.cache_ttl),
        };

        Self::new(
            Arc::new(RwLock::new(cache)),
            upstream,
            store,
            MockGenerator::new(config.mock_seed),
            FallbackPolicy::from_config(config),
        )
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    // == List Nodes ==
    /// Returns every node. `refresh` skips the cache read but the result is
    /// still cached.
    pub async fn list_nodes(&self, refresh: bool) -> Result<Served> {
        if !refresh {
            if let Some(snapshot) = self.cache.write().await.get(ALL_NODES_KEY) {
                return Ok(Served::from_cache(snapshot));
            }
        }

        let snapshot = self.resolve_all().await?;
        report_storage_defects(&snapshot);
        info!(
            source = %snapshot.source,
            count = snapshot.nodes.len(),
            refresh,
            "pNode list resolved"
        );

        self.cache
            .write()
            .await
            .set(ALL_NODES_KEY, snapshot.clone(), None);
        Ok(Served::fresh(snapshot))
    }

    /// Re-runs the list chain unconditionally; used by the refresh task.
    pub async fn refresh_all(&self) -> Result<Served> {
        self.list_nodes(true).await
    }

    async fn resolve_all(&self) -> Result<Snapshot> {
        if self.policy.calls_upstream() {
            match self.upstream.fetch_all_nodes().await {
                Ok(nodes) => {
                    self.persist(&nodes).await;
                    return Ok(Snapshot::new(DataSource::Upstream, nodes));
                }
                Err(err) => self.recover_upstream(err, "list")?,
            }
        }

        if self.policy.reads_store() {
            let stored = self.read_store().await;
            if !stored.is_empty() || !self.policy.allows_mock() {
                return Ok(Snapshot::new(DataSource::Database, stored));
            }
        }

        Ok(Snapshot::new(DataSource::Mock, self.mock_tick().await))
    }

    // == Get Node ==
    /// Returns one node, or `NotFound` once every enabled source lacks it.
    pub async fn get_node(&self, id: &str) -> Result<Served> {
        let key = node_cache_key(id);
        if let Some(snapshot) = self.cache.write().await.get(&key) {
            return Ok(Served::from_cache(snapshot));
        }

        let snapshot = self.resolve_one(id).await?;
        report_storage_defects(&snapshot);
        self.cache.write().await.set(key, snapshot.clone(), None);
        Ok(Served::fresh(snapshot))
    }

    async fn resolve_one(&self, id: &str) -> Result<Snapshot> {
        if self.policy.calls_upstream() {
            match self.upstream.fetch_node_by_id(id).await {
                Ok(node) if node.id == id => {
                    self.persist(std::slice::from_ref(&node)).await;
                    return Ok(Snapshot::new(DataSource::Upstream, vec![node]));
                }
                Ok(node) => {
                    let mismatch = FetchError::new(
                        FetchErrorKind::Shape,
                        format!("asked for pNode {id}, upstream answered with {}", node.id),
                    );
                    self.recover_upstream(mismatch, id)?
                }
                Err(err) => self.recover_upstream(err, id)?,
            }
        }

        if self.policy.reads_store() {
            match self.store.find_by_id(id).await {
                Ok(Some(node)) => return Ok(Snapshot::new(DataSource::Database, vec![node])),
                Ok(None) => {}
                Err(err) => warn!(node = %id, "store lookup failed, skipping: {}", err),
            }
        }

        if self.policy.allows_mock() {
            let mut mock = self.mock.lock().await;
            if mock.is_empty() {
                mock.generate(self.policy.mock_node_count);
            }
            if let Some(node) = mock.find(id) {
                return Ok(Snapshot::new(DataSource::Mock, vec![node.clone()]));
            }
        }

        Err(AppError::NotFound("pNode not found".to_string()))
    }

    // == Statistics ==
    /// Aggregates over the persisted records, or over the mock population
    /// when the store is empty and mock data is allowed.
    pub async fn statistics(&self) -> Result<(DataSource, AggregateStatistics)> {
        if self.policy.reads_store() {
            let records = self.store.find_all().await?;
            if !records.is_empty() || !self.policy.allows_mock() {
                return Ok((DataSource::Database, AggregateStatistics::from_records(&records)));
            }
        }

        let mut mock = self.mock.lock().await;
        if mock.is_empty() {
            mock.generate(self.policy.mock_node_count);
        }
        Ok((DataSource::Mock, AggregateStatistics::from_records(mock.records())))
    }

    // == Chain Helpers ==
    /// Logs a recoverable upstream failure; fatal ones are returned.
    fn recover_upstream(&self, err: FetchError, lookup: &str) -> Result<()> {
        if !err.is_recoverable() {
            return Err(err.into());
        }
        match err.kind {
            FetchErrorKind::Dns => {
                warn!(lookup, "pRPC API unreachable (DNS), falling back to database: {}", err)
            }
            _ => warn!(lookup, "pRPC fetch failed, falling back to database: {}", err),
        }
        Ok(())
    }

    /// Upserts every record concurrently. Individual failures are logged and
    /// never fail the caller.
    async fn persist(&self, nodes: &[NodeRecord]) {
        let writes = nodes
            .iter()
            .map(|node| self.store.upsert(&node.id, node.clone()));
        let results = join_all(writes).await;

        let mut failed = 0usize;
        for (node, result) in nodes.iter().zip(results) {
            if let Err(err) = result {
                failed += 1;
                warn!(node = %node.id, "failed to persist pNode: {}", err);
            }
        }
        if failed > 0 {
            warn!(failed, total = nodes.len(), "some pNodes were not persisted");
        }
    }

    /// All stored records; a read failure counts as an empty store.
    async fn read_store(&self) -> Vec<NodeRecord> {
        match self.store.find_all().await {
            Ok(records) => records,
            Err(err) => {
                warn!("store read failed, treating as empty: {}", err);
                Vec::new()
            }
        }
    }

    /// Generates the mock population on first use, advances it afterwards.
    async fn mock_tick(&self) -> Vec<NodeRecord> {
        let mut mock = self.mock.lock().await;
        if mock.is_empty() {
            info!(count = self.policy.mock_node_count, "generating mock pNodes");
            mock.generate(self.policy.mock_node_count)
        } else {
            mock.advance()
        }
    }
}

/// Flags records that break `used + available == total`.
fn report_storage_defects(snapshot: &Snapshot) {
    for id in storage_violations(&snapshot.nodes) {
        warn!(node = %id, source = %snapshot.source, "data-quality defect: storage used + available != total");
    }
}
