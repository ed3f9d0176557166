//! Shared harness for registry integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use subweaver_core::{
    collaborator::{BoundaryOracle, Fetcher, Transcriber, Translator},
    executor::RetryConfig,
    job::{JobId, JobStatus, JobStore, SqliteJobStore},
    orchestrator::{Collaborators, JobOrchestrator, OrchestratorConfig},
    registry::{JobRegistry, SchedulerConfig},
    storage::ArtifactStorage,
    testing::{MemoryStorage, MockBoundaryOracle, MockFetcher, MockTranscriber, MockTranslator},
};

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Test helper to create all dependencies for registry testing.
pub struct TestHarness {
    pub fetcher: MockFetcher,
    pub transcriber: MockTranscriber,
    pub translator: MockTranslator,
    pub oracle: MockBoundaryOracle,
    pub storage: MemoryStorage,
    pub job_store: Arc<SqliteJobStore>,
    _temp_dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let job_store = Arc::new(
            SqliteJobStore::new(&temp_dir.path().join("jobs.db"))
                .expect("Failed to create job store"),
        );

        Self {
            fetcher: MockFetcher::new(),
            transcriber: MockTranscriber::new(),
            translator: MockTranslator::new(),
            oracle: MockBoundaryOracle::new(),
            storage: MemoryStorage::new(),
            job_store,
            _temp_dir: temp_dir,
        }
    }

    pub fn orchestrator_config() -> OrchestratorConfig {
        OrchestratorConfig::default().with_retry(RetryConfig::immediate(3))
    }

    pub fn registry(&self) -> JobRegistry {
        self.registry_with(SchedulerConfig::default(), Self::orchestrator_config())
    }

    pub fn registry_with(
        &self,
        scheduler: SchedulerConfig,
        config: OrchestratorConfig,
    ) -> JobRegistry {
        let collaborators = Collaborators {
            fetcher: Arc::new(self.fetcher.clone()) as Arc<dyn Fetcher>,
            transcriber: Arc::new(self.transcriber.clone()) as Arc<dyn Transcriber>,
            translator: Arc::new(self.translator.clone()) as Arc<dyn Translator>,
            boundary_oracle: Some(Arc::new(self.oracle.clone()) as Arc<dyn BoundaryOracle>),
            storage: Arc::new(self.storage.clone()) as Arc<dyn ArtifactStorage>,
            job_store: Arc::clone(&self.job_store) as Arc<dyn JobStore>,
        };
        let orchestrator = Arc::new(JobOrchestrator::new(config, collaborators));

        JobRegistry::new(
            scheduler,
            orchestrator,
            Arc::clone(&self.job_store) as Arc<dyn JobStore>,
            Arc::new(self.storage.clone()) as Arc<dyn ArtifactStorage>,
        )
    }

    pub async fn wait_for_status(
        registry: &JobRegistry,
        id: &JobId,
        expected: JobStatus,
        timeout: Duration,
    ) -> bool {
        let start = std::time::Instant::now();
        let poll_interval = Duration::from_millis(10);

        while start.elapsed() < timeout {
            if let Ok(view) = registry.status(id) {
                if view.status == expected {
                    return true;
                }
                // Stop if we hit a different terminal state
                if view.status.is_terminal() {
                    return false;
                }
            }
            tokio::time::sleep(poll_interval).await;
        }
        false
    }

    /// Waits until the persisted record reaches `expected`.
    pub async fn wait_for_stored(&self, id: &JobId, expected: JobStatus) -> bool {
        let store = Arc::clone(&self.job_store);
        Self::wait_until(
            || matches!(store.get(id), Ok(Some(job)) if job.status == expected),
            TIMEOUT,
        )
        .await
    }

    pub async fn wait_until(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

