//! Stage executors.
//!
//! Every external call made by the pipeline goes through a [`StageRunner`],
//! which applies the per-call timeout and the shared [`RetryConfig`]. The
//! executors built on it are independently invokable and idempotent under
//! retry: any artifact they write lands on the same deterministic key.

mod config;
mod error;
mod executors;
mod retry;
mod stage;

pub use config::ExecutorConfig;
pub use error::ExecutorError;
pub use executors::{
    ArtifactWriter, BoundaryExecutor, FetchExecutor, StageExecutor, TranscribeExecutor,
    TranslateExecutor,
};
pub use retry::RetryConfig;
pub use stage::{StageContext, StageRunner};
