//! JSON-file node store
//!
//! Keeps the records in memory and rewrites the whole file on every upsert,
//! so the data survives restarts. Record volume is small enough that a full
//! rewrite is cheaper than any incremental format.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::info;

use super::{NodeStore, PersistenceError};
use crate::models::NodeRecord;

#[derive(Debug)]
pub struct JsonFileNodeStore {
    path: PathBuf,
    records: RwLock<BTreeMap<String, NodeRecord>>,
}

impl JsonFileNodeStore {
    /// Opens the store at `path`; a missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let records = match fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice::<Vec<NodeRecord>>(&bytes)?
                .into_iter()
                .map(|record| (record.id.clone(), record))
                .collect(),
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(io_error(&path, source)),
        };

        info!(path = %path.display(), records = records.len(), "node store opened");
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Writes `records` to a sibling temp file and renames it over the store
    /// file, so a crash mid-write leaves the previous contents intact.
    async fn persist(&self, records: &BTreeMap<String, NodeRecord>) -> Result<(), PersistenceError> {
        let rows: Vec<&NodeRecord> = records.values().collect();
        let body = serde_json::to_vec_pretty(&rows)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)
            .await
            .map_err(|source| io_error(&tmp, source))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| io_error(&self.path, source))
    }
}

#[async_trait]
impl NodeStore for JsonFileNodeStore {
    async fn upsert(&self, id: &str, mut record: NodeRecord) -> Result<NodeRecord, PersistenceError> {
        record.id = id.to_string();

        // Write lock held across the file write so upserts are serialized
        let mut records = self.records.write().await;
        let mut next = records.clone();
        next.insert(id.to_string(), record.clone());
        self.persist(&next).await?;
        *records = next;

        Ok(record)
    }

    async fn find_all(&self) -> Result<Vec<NodeRecord>, PersistenceError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<NodeRecord>, PersistenceError> {
        Ok(self.records.read().await.get(id).cloned())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.display().to_string(),
        source,
    }
}
