use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("invalid artifact key: {0}")]
    InvalidKey(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Missing artifacts and bad keys will not fix themselves on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
