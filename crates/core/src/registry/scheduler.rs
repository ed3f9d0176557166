//! Job registry and scheduler.
//!
//! One mutex guards the job map, the FIFO admission queue and the active
//! slot count. Jobs are admitted while a slot is free; each admitted job runs
//! on its own task and releases its slot when it reaches a terminal state.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::job::{
    ErrorKind, Job, JobFilter, JobHandle, JobId, JobRequest, JobStatus, JobStatusView, JobStore,
    StageFailure,
};
use crate::metrics;
use crate::orchestrator::JobOrchestrator;
use crate::storage::{ArtifactKey, ArtifactStorage};

use super::config::SchedulerConfig;
use super::types::{RegistryError, RegistrySummary};

#[derive(Default)]
struct State {
    jobs: HashMap<JobId, Arc<JobHandle>>,
    queue: VecDeque<JobId>,
    active: usize,
}

struct Shared {
    config: SchedulerConfig,
    orchestrator: Arc<JobOrchestrator>,
    job_store: Arc<dyn JobStore>,
    storage: Arc<dyn ArtifactStorage>,
    state: Mutex<State>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, job: &Job) {
        if let Err(e) = self.job_store.save(job) {
            warn!(job_id = %job.id, error = %e, "Failed to persist job record");
        }
    }

    fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        // A retention too large to represent never expires.
        let retention = i64::try_from(self.config.retention_secs)
            .ok()
            .and_then(TimeDelta::try_seconds);
        let mut state = self.state();
        let before = state.jobs.len();
        state.jobs.retain(|_, handle| {
            let job = handle.snapshot();
            if !job.status.is_terminal() {
                return true;
            }
            match retention.and_then(|r| job.updated_at.checked_add_signed(r)) {
                Some(expires_at) => expires_at > now,
                None => true,
            }
        });
        let evicted = before - state.jobs.len();
        if evicted > 0 {
            info!(evicted, remaining = state.jobs.len(), "Evicted expired jobs");
        }
        evicted
    }

    /// Records a job whose task died without reaching a terminal state.
    fn fail_aborted(&self, handle: &JobHandle, reason: &str) {
        warn!(job_id = %handle.id(), error = %reason, "Job task aborted");
        let failure = StageFailure::new(
            handle.status(),
            "orchestrator",
            ErrorKind::Permanent,
            "job task aborted unexpectedly",
        );
        if handle.update(|job| job.fail(failure)).is_ok() {
            metrics::JOBS_FINISHED.with_label_values(&["failed"]).inc();
            self.persist(&handle.snapshot());
        }
    }

    /// Starts queued jobs, oldest first, while slots are free.
    fn admit(shared: &Arc<Shared>) {
        let mut admitted = Vec::new();
        {
            let mut state = shared.state();
            while state.active < shared.config.max_concurrent_jobs {
                let Some(id) = state.queue.pop_front() else {
                    break;
                };
                let Some(handle) = state.jobs.get(&id).cloned() else {
                    continue;
                };
                if handle.status() != JobStatus::Queued {
                    continue;
                }
                state.active += 1;
                admitted.push(handle);
            }
            metrics::JOBS_ACTIVE.set(state.active as i64);
            metrics::JOBS_QUEUED.set(state.queue.len() as i64);
        }

        for handle in admitted {
            debug!(job_id = %handle.id(), "Admitting job");
            let slot = Slot {
                shared: shared.clone(),
            };
            tokio::spawn(async move {
                let task = tokio::spawn({
                    let shared = slot.shared.clone();
                    let handle = handle.clone();
                    async move { shared.orchestrator.run(&handle).await }
                });
                match task.await {
                    Ok(status) => debug!(job_id = %handle.id(), %status, "Job task finished"),
                    Err(e) => slot.shared.fail_aborted(&handle, &e.to_string()),
                }
                drop(slot);
            });
        }
    }
}

/// An admitted job's concurrency slot. Released on drop, and the next
/// queued job is admitted.
struct Slot {
    shared: Arc<Shared>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state();
            state.active = state.active.saturating_sub(1);
            metrics::JOBS_ACTIVE.set(state.active as i64);
        }
        if tokio::runtime::Handle::try_current().is_ok() {
            Shared::admit(&self.shared);
        }
    }
}

/// Admission control and lookup for subtitle jobs.
pub struct JobRegistry {
    shared: Arc<Shared>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl JobRegistry {
    pub fn new(
        config: SchedulerConfig,
        orchestrator: Arc<JobOrchestrator>,
        job_store: Arc<dyn JobStore>,
        storage: Arc<dyn ArtifactStorage>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            shared: Arc::new(Shared {
                config,
                orchestrator,
                job_store,
                storage,
                state: Mutex::new(State::default()),
            }),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    /// Creates a job in `Queued` and returns its id without waiting for it
    /// to run. Invalid requests never create a job.
    pub async fn submit(&self, request: JobRequest) -> Result<JobId, RegistryError> {
        validate_request(&self.shared.config, &request)?;

        let job = Job::new(request);
        let id = job.id;
        self.shared.job_store.save(&job)?;

        {
            let mut state = self.shared.state();
            state.jobs.insert(id, Arc::new(JobHandle::new(job)));
            state.queue.push_back(id);
            metrics::JOBS_QUEUED.set(state.queue.len() as i64);
        }
        metrics::JOBS_SUBMITTED.inc();
        info!(job_id = %id, "Job submitted");

        Shared::admit(&self.shared);
        Ok(id)
    }

    fn handle(&self, id: &JobId) -> Option<Arc<JobHandle>> {
        self.shared.state().jobs.get(id).cloned()
    }

    /// Current job record. Falls back to the job store for evicted jobs.
    pub fn snapshot(&self, id: &JobId) -> Result<Job, RegistryError> {
        if let Some(handle) = self.handle(id) {
            return Ok(handle.snapshot());
        }
        self.shared
            .job_store
            .get(id)?
            .ok_or(RegistryError::NotFound(*id))
    }

    pub fn status(&self, id: &JobId) -> Result<JobStatusView, RegistryError> {
        self.snapshot(id).map(|job| job.view())
    }

    /// Requests cancellation without waiting for the job to stop.
    ///
    /// A queued job is cancelled on the spot and never enters `Fetching`.
    /// Cancelling a finished job is a no-op.
    pub fn cancel(&self, id: &JobId) -> Result<(), RegistryError> {
        let handle = {
            let mut state = self.shared.state();
            let Some(handle) = state.jobs.get(id).cloned() else {
                drop(state);
                return self.snapshot(id).map(|_| ());
            };

            if let Some(pos) = state.queue.iter().position(|queued| queued == id) {
                state.queue.remove(pos);
                metrics::JOBS_QUEUED.set(state.queue.len() as i64);
                if handle.update(Job::cancel).is_ok() {
                    drop(state);
                    info!(job_id = %id, "Queued job cancelled");
                    metrics::JOBS_FINISHED.with_label_values(&["cancelled"]).inc();
                    self.shared.persist(&handle.snapshot());
                }
                return Ok(());
            }
            handle
        };

        if handle.request_cancel() {
            info!(job_id = %id, status = %handle.status(), "Cancellation requested");
            self.shared.persist(&handle.snapshot());
        }
        Ok(())
    }

    /// Reference of the finished subtitle artifact.
    pub fn get_result(&self, id: &JobId) -> Result<String, RegistryError> {
        let job = self.snapshot(id)?;
        match (job.status, job.result_artifact_ref) {
            (JobStatus::Succeeded, Some(artifact)) => Ok(artifact),
            (status, _) => Err(RegistryError::NotReady { id: *id, status }),
        }
    }

    /// Bytes of the finished subtitle artifact.
    pub async fn artifact(&self, id: &JobId) -> Result<Vec<u8>, RegistryError> {
        let key = ArtifactKey::parse(&self.get_result(id)?)?;
        Ok(self.shared.storage.read(&key).await?)
    }

    /// Removes terminal jobs whose last update is older than the retention
    /// window. Returns how many were evicted.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        self.shared.evict_expired(now)
    }

    pub fn summary(&self) -> RegistrySummary {
        let state = self.shared.state();
        let finished = state
            .jobs
            .values()
            .filter(|h| h.status().is_terminal())
            .count();
        RegistrySummary {
            running: self.running.load(Ordering::SeqCst),
            queued: state.queue.len(),
            active: state.active,
            finished,
            max_concurrent_jobs: self.shared.config.max_concurrent_jobs,
        }
    }

    /// Marks stored jobs left unfinished by a previous process as failed,
    /// then starts the retention sweeper.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Job registry already running");
            return;
        }

        info!("Starting job registry");
        self.recover_interrupted();
        self.spawn_sweeper();
    }

    /// Stops the retention sweeper. Running jobs are not affected.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Job registry not running");
            return;
        }

        info!("Stopping job registry");
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn recover_interrupted(&self) {
        let orphans = match self
            .shared
            .job_store
            .list(&JobFilter::new().unfinished().with_limit(i64::MAX))
        {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!(error = %e, "Failed to list unfinished jobs");
                return;
            }
        };

        let live: Vec<JobId> = self.shared.state().jobs.keys().copied().collect();
        for mut job in orphans.into_iter().filter(|j| !live.contains(&j.id)) {
            let failure = StageFailure::new(
                job.status,
                "registry",
                ErrorKind::Permanent,
                "interrupted before completion",
            );
            if job.fail(failure).is_ok() {
                warn!(job_id = %job.id, "Marking interrupted job as failed");
                self.shared.persist(&job);
            }
        }
    }

    fn spawn_sweeper(&self) {
        let shared = self.shared.clone();
        let running = self.running.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = shared.config.sweep_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Retention sweeper shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        if !running.load(Ordering::SeqCst) {
                            break;
                        }
                        shared.evict_expired(Utc::now());
                    }
                }
            }
        });
    }
}

fn validate_request(config: &SchedulerConfig, request: &JobRequest) -> Result<(), RegistryError> {
    let input = request.input_ref.trim();
    if input.is_empty() {
        return Err(RegistryError::InvalidInput(
            "input reference is empty".to_string(),
        ));
    }
    if input
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(RegistryError::InvalidInput(
            "input reference contains whitespace or control characters".to_string(),
        ));
    }
    if input.starts_with('-') {
        return Err(RegistryError::InvalidInput(
            "input reference must not start with '-'".to_string(),
        ));
    }
    let hint_chars = request.context_hint.chars().count();
    if hint_chars > config.max_context_hint_chars {
        return Err(RegistryError::InvalidInput(format!(
            "context hint is {} characters, limit is {}",
            hint_chars, config.max_context_hint_chars
        )));
    }
    Ok(())
}
