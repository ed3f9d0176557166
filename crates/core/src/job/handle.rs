use std::sync::{PoisonError, RwLock};
use tokio_util::sync::CancellationToken;

use super::types::{Job, JobId, JobStatus};

/// Shared reference to a live job.
///
/// The orchestrator writes through [`update`](Self::update); everyone else
/// reads snapshots or requests cancellation.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    job: RwLock<Job>,
    cancel: CancellationToken,
}

impl JobHandle {
    pub fn new(job: Job) -> Self {
        Self {
            id: job.id,
            job: RwLock::new(job),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// A copy of the job record as of now.
    pub fn snapshot(&self) -> Job {
        self.job
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn status(&self) -> JobStatus {
        self.job
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
    }

    /// Sets `cancel_requested` and fires the cancellation token so in-flight
    /// collaborator calls are dropped. Returns false if the job already
    /// finished.
    pub fn request_cancel(&self) -> bool {
        let flagged = self.update(Job::request_cancel);
        if flagged {
            self.cancel.cancel();
        }
        flagged
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.job
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel_requested
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Runs `f` with exclusive access to the record. Checks and transitions
    /// done inside one call are atomic with respect to cancel requests.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut Job) -> R) -> R {
        let mut job = self.job.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut job)
    }
}
