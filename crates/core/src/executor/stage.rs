//! Retry/timeout wrapper shared by every stage executor.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::collaborator::CollaboratorError;
use crate::job::JobId;
use crate::metrics;

use super::error::ExecutorError;
use super::retry::RetryConfig;

/// Per-invocation context handed to executors.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub job_id: JobId,
    pub cancel: CancellationToken,
}

impl StageContext {
    pub fn new(job_id: JobId, cancel: CancellationToken) -> Self {
        Self { job_id, cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Runs one collaborator call under a timeout, retrying transient failures.
#[derive(Debug, Clone)]
pub struct StageRunner {
    collaborator: String,
    retry: RetryConfig,
    timeout: Duration,
}

impl StageRunner {
    pub fn new(collaborator: impl Into<String>, retry: RetryConfig, timeout: Duration) -> Self {
        Self {
            collaborator: collaborator.into(),
            retry,
            timeout,
        }
    }

    pub fn collaborator(&self) -> &str {
        &self.collaborator
    }

    /// Calls `op(attempt)` until it succeeds, fails permanently, or the
    /// attempt budget runs out.
    ///
    /// A call that outlives the timeout is dropped and counted as transient.
    /// Cancelling the context drops the in-flight call and any pending
    /// backoff sleep.
    pub async fn run<T, F, Fut>(&self, ctx: &StageContext, mut op: F) -> Result<T, ExecutorError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, CollaboratorError>>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let seed = format!("{}:{}", ctx.job_id, self.collaborator);
        let mut attempt = 1;

        loop {
            if ctx.is_cancelled() {
                return Err(ExecutorError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => return Err(ExecutorError::Cancelled),
                result = tokio::time::timeout(self.timeout, op(attempt)) => match result {
                    Ok(result) => result,
                    Err(_) => Err(CollaboratorError::transient(format!(
                        "timed out after {:?}",
                        self.timeout
                    ))),
                },
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !error.is_retryable() || attempt >= max_attempts {
                return Err(ExecutorError::Permanent {
                    collaborator: self.collaborator.clone(),
                    attempts: attempt,
                    message: error.message().to_string(),
                });
            }

            let delay = self.retry.delay_for(attempt, &seed);
            warn!(
                job_id = %ctx.job_id,
                collaborator = %self.collaborator,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient failure, retrying"
            );
            metrics::COLLABORATOR_RETRIES
                .with_label_values(&[&self.collaborator])
                .inc();

            tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => return Err(ExecutorError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}
