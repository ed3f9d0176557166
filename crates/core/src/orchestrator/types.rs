//! Types for the job orchestrator.

use std::sync::Arc;
use thiserror::Error;

use crate::collaborator::{BoundaryOracle, Fetcher, Transcriber, Translator};
use crate::executor::ExecutorError;
use crate::job::{ErrorKind, JobStatus, JobStore, StageFailure, TransitionError};
use crate::storage::ArtifactStorage;

/// Why a job stopped before succeeding.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("cancelled")]
    Cancelled,

    #[error("{}", .0.summary())]
    Failed(StageFailure),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl OrchestratorError {
    /// Maps an executor outcome onto the job taxonomy.
    pub(crate) fn from_executor(stage: JobStatus, error: ExecutorError) -> Self {
        match error {
            ExecutorError::Cancelled => Self::Cancelled,
            ExecutorError::Permanent {
                collaborator,
                message,
                ..
            } => Self::Failed(StageFailure::new(
                stage,
                collaborator,
                ErrorKind::Permanent,
                message,
            )),
        }
    }
}

/// The external collaborators a job runs against.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
    /// Required only for assisted sentence splitting.
    pub boundary_oracle: Option<Arc<dyn BoundaryOracle>>,
    pub storage: Arc<dyn ArtifactStorage>,
    pub job_store: Arc<dyn JobStore>,
}
