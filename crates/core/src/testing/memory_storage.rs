//! In-memory artifact storage for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{ArtifactKey, ArtifactStorage, StorageError};

/// Artifact storage backed by a map. Counts writes per key so tests can
/// check that retries overwrite rather than duplicate.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    writes: Arc<RwLock<BTreeMap<String, u32>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.read().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.blobs.read().await.keys().cloned().collect()
    }

    pub async fn write_count(&self, key: &str) -> u32 {
        self.writes.read().await.get(key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ArtifactStorage for MemoryStorage {
    async fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<(), StorageError> {
        self.blobs
            .write()
            .await
            .insert(key.to_string(), bytes.to_vec());
        *self.writes.write().await.entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn read(&self, key: &ArtifactKey) -> Result<Vec<u8>, StorageError> {
        self.get(key.as_str())
            .await
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}
