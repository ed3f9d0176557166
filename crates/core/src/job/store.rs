//! Job record persistence.

use thiserror::Error;

use super::types::{Job, JobId, JobStatus};

#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("corrupt job record {id}: {message}")]
    Corrupt { id: String, message: String },
}

/// Filter for listing job records.
#[derive(Debug, Clone)]
pub struct JobFilter {
    /// Only jobs in one of these states. Empty means any.
    pub statuses: Vec<JobStatus>,
    /// Maximum number of results.
    pub limit: i64,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl JobFilter {
    pub fn new() -> Self {
        Self {
            statuses: Vec::new(),
            limit: 100,
        }
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.statuses.push(status);
        self
    }

    /// Every non-terminal state.
    pub fn unfinished(mut self) -> Self {
        self.statuses = JobStatus::ALL
            .into_iter()
            .filter(|s| !s.is_terminal())
            .collect();
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub(crate) fn matches(&self, job: &Job) -> bool {
        self.statuses.is_empty() || self.statuses.contains(&job.status)
    }
}

/// Storage backend for job records. One record per job id.
pub trait JobStore: Send + Sync {
    /// Inserts or replaces the record for `job.id`.
    fn save(&self, job: &Job) -> Result<(), JobStoreError>;

    fn get(&self, id: &JobId) -> Result<Option<Job>, JobStoreError>;

    /// Lists matching jobs, oldest first.
    fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, JobStoreError>;
}
