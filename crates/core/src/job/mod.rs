//! Job records and the status state machine.
//!
//! A [`Job`] is written by exactly one orchestrator task. The registry keeps
//! an `Arc<JobHandle>` per job for status reads and cancellation requests.

mod handle;
mod memory_store;
mod sqlite_store;
mod store;
mod types;

pub use handle::JobHandle;
pub use memory_store::InMemoryJobStore;
pub use sqlite_store::SqliteJobStore;
pub use store::{JobFilter, JobStore, JobStoreError};
pub use types::{
    ErrorKind, Job, JobId, JobRequest, JobStatus, JobStatusView, StageFailure, TransitionError,
};
