//! Types for the job registry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::{JobId, JobStatus, JobStoreError};
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Rejected at submission; no job was created.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("job not found: {0}")]
    NotFound(JobId),

    #[error("job {id} has no result yet (status {status})")]
    NotReady { id: JobId, status: JobStatus },

    #[error("job store error: {0}")]
    Store(#[from] JobStoreError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Point-in-time counts of the jobs held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySummary {
    /// Whether the retention sweeper is running.
    pub running: bool,
    pub queued: usize,
    /// Jobs admitted and not yet terminal.
    pub active: usize,
    /// Terminal jobs still inside the retention window.
    pub finished: usize,
    pub max_concurrent_jobs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let id = JobId::new();
        let err = RegistryError::NotReady {
            id,
            status: JobStatus::Translating,
        };
        assert_eq!(
            err.to_string(),
            format!("job {} has no result yet (status Translating)", id)
        );
        assert_eq!(
            RegistryError::InvalidInput("empty input reference".to_string()).to_string(),
            "invalid input: empty input reference"
        );
    }
}
