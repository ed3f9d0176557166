//! Artifact storage.
//!
//! Intermediate and final artifacts are addressed by job id and stage name,
//! so a retried stage always writes to the same key and overwrites what a
//! previous attempt left behind.

mod error;
mod fs;
mod key;

pub use error::StorageError;
pub use fs::FsArtifactStorage;
pub use key::ArtifactKey;

use async_trait::async_trait;

/// Opaque read/write store for job artifacts.
#[async_trait]
pub trait ArtifactStorage: Send + Sync {
    /// Writes `bytes` under `key`, replacing any previous content.
    async fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<(), StorageError>;

    /// Reads the bytes stored under `key`.
    async fn read(&self, key: &ArtifactKey) -> Result<Vec<u8>, StorageError>;
}
