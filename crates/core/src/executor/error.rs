use thiserror::Error;

use crate::collaborator::CollaboratorError;
use crate::storage::StorageError;

/// Failure leaving a stage executor. Transient errors are retried inside the
/// executor and only surface here once the budget is spent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("{collaborator} failed after {attempts} attempt(s): {message}")]
    Permanent {
        collaborator: String,
        attempts: u32,
        message: String,
    },

    #[error("cancelled")]
    Cancelled,
}

impl ExecutorError {
    pub fn collaborator(&self) -> Option<&str> {
        match self {
            Self::Permanent { collaborator, .. } => Some(collaborator),
            Self::Cancelled => None,
        }
    }
}

impl From<StorageError> for CollaboratorError {
    fn from(e: StorageError) -> Self {
        if e.is_retryable() {
            CollaboratorError::transient(e.to_string())
        } else {
            CollaboratorError::permanent(e.to_string())
        }
    }
}
