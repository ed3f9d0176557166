use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::StorageError;
use super::key::ArtifactKey;
use super::ArtifactStorage;

/// Stores artifacts as files under a root directory.
///
/// Writes go to a `.partial` sibling first and are renamed into place, so
/// readers never observe a half-written artifact.
#[derive(Debug, Clone)]
pub struct FsArtifactStorage {
    root: PathBuf,
}

impl FsArtifactStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path backing `key`.
    pub fn path_for(&self, key: &ArtifactKey) -> PathBuf {
        key.as_str()
            .split('/')
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

#[async_trait]
impl ArtifactStorage for FsArtifactStorage {
    async fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut partial = path.clone().into_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        tokio::fs::write(&partial, bytes).await?;
        tokio::fs::rename(&partial, &path).await?;

        debug!(key = %key, bytes = bytes.len(), "Wrote artifact");
        Ok(())
    }

    async fn read(&self, key: &ArtifactKey) -> Result<Vec<u8>, StorageError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
