//! In-memory node store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{NodeStore, PersistenceError};
use crate::models::NodeRecord;

/// Node records keyed by id, held for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    records: RwLock<BTreeMap<String, NodeRecord>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `records`, keyed by their ids.
    pub fn with_records(records: impl IntoIterator<Item = NodeRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: RwLock::new(map),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl NodeStore for MemoryNodeStore {
    async fn upsert(&self, id: &str, mut record: NodeRecord) -> Result<NodeRecord, PersistenceError> {
        record.id = id.to_string();
        self.records
            .write()
            .await
            .insert(id.to_string(), record.clone());
        Ok(record)
    }

    async fn find_all(&self) -> Result<Vec<NodeRecord>, PersistenceError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<NodeRecord>, PersistenceError> {
        Ok(self.records.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::node::fixtures::node;
    use crate::models::NodeStatus;

    #[tokio::test]
    async fn test_upsert_inserts_then_replaces() {
        let store = MemoryNodeStore::new();
        store
            .upsert("a", node("a", NodeStatus::Active, "Europe", 1))
            .await
            .unwrap();
        store
            .upsert("a", node("a", NodeStatus::Offline, "Europe", 2))
            .await
            .unwrap();

        let stored = store.find_by_id("a").await.unwrap().unwrap();
        assert_eq!(stored.status, NodeStatus::Offline);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_upsert_keys_by_given_id() {
        let store = MemoryNodeStore::new();
        let stored = store
            .upsert("canonical", node("other", NodeStatus::Active, "Europe", 1))
            .await
            .unwrap();

        assert_eq!(stored.id, "canonical");
        assert!(store.find_by_id("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_all_is_ordered_by_id() {
        let store = MemoryNodeStore::with_records(vec![
            node("c", NodeStatus::Active, "Europe", 1),
            node("a", NodeStatus::Active, "Europe", 1),
            node("b", NodeStatus::Active, "Europe", 1),
        ]);

        let ids: Vec<String> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_find_missing() {
        let store = MemoryNodeStore::new();
        assert!(store.find_by_id("nope").await.unwrap().is_none());
        assert!(store.find_all().await.unwrap().is_empty());
    }
}
