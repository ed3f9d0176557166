//! Job types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Opaque job identifier. Assigned at creation, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Pipeline status of a job.
///
/// Non-terminal states advance strictly in declaration order. `Failed` and
/// `Cancelled` are reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Fetching,
    Transcribing,
    Translating,
    Rendering,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 8] = [
        JobStatus::Queued,
        JobStatus::Fetching,
        JobStatus::Transcribing,
        JobStatus::Translating,
        JobStatus::Rendering,
        JobStatus::Succeeded,
        JobStatus::Failed,
        JobStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Fetching => "Fetching",
            JobStatus::Transcribing => "Transcribing",
            JobStatus::Translating => "Translating",
            JobStatus::Rendering => "Rendering",
            JobStatus::Succeeded => "Succeeded",
            JobStatus::Failed => "Failed",
            JobStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// True for the stage-executing states (admitted but not finished).
    pub fn is_running(&self) -> bool {
        !self.is_terminal() && *self != JobStatus::Queued
    }

    /// The next state on the success path, if any.
    pub fn next(&self) -> Option<JobStatus> {
        match self {
            JobStatus::Queued => Some(JobStatus::Fetching),
            JobStatus::Fetching => Some(JobStatus::Transcribing),
            JobStatus::Transcribing => Some(JobStatus::Translating),
            JobStatus::Translating => Some(JobStatus::Rendering),
            JobStatus::Rendering => Some(JobStatus::Succeeded),
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled => None,
        }
    }

    /// Progress reported on entering this state. `Failed` and `Cancelled`
    /// keep whatever the job had reached.
    pub fn progress_on_entry(&self) -> Option<f64> {
        match self {
            JobStatus::Queued => Some(0.0),
            JobStatus::Fetching => Some(0.1),
            JobStatus::Transcribing => Some(0.3),
            JobStatus::Translating => Some(TRANSLATING_PROGRESS.0),
            JobStatus::Rendering => Some(TRANSLATING_PROGRESS.1),
            JobStatus::Succeeded => Some(1.0),
            JobStatus::Failed | JobStatus::Cancelled => None,
        }
    }
}

/// Progress band covered by the translation sub-stage.
const TRANSLATING_PROGRESS: (f64, f64) = (0.5, 0.85);

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown job status: {}", s))
    }
}

/// Error taxonomy recorded on failed jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    InvalidRange,
    Transient,
    Permanent,
    Cancelled,
}

/// Structured error recorded when a job fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    /// Status name the job was in when it failed, e.g. "Transcribing".
    pub stage: String,
    /// Collaborator or internal component that failed.
    pub collaborator: String,
    pub kind: ErrorKind,
    /// One-line summary.
    pub message: String,
}

impl StageFailure {
    pub fn new(
        stage: JobStatus,
        collaborator: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        let message: String = message.into();
        Self {
            stage: stage.as_str().to_string(),
            collaborator: collaborator.into(),
            kind,
            message: message.lines().next().unwrap_or_default().to_string(),
        }
    }

    pub fn summary(&self) -> String {
        format!("{} failed in {}: {}", self.stage, self.collaborator, self.message)
    }
}

/// A job submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Source locator, usually a video URL.
    pub input_ref: String,
    /// Free-form guidance for the translator.
    #[serde(default)]
    pub context_hint: String,
}

impl JobRequest {
    pub fn new(input_ref: impl Into<String>) -> Self {
        Self {
            input_ref: input_ref.into(),
            context_hint: String::new(),
        }
    }

    pub fn with_context_hint(mut self, hint: impl Into<String>) -> Self {
        self.context_hint = hint.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition from {from} to {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// One end-to-end subtitle generation request and its state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub input_ref: String,
    pub context_hint: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub stage_error: Option<StageFailure>,
    pub result_artifact_ref: Option<String>,
    pub cancel_requested: bool,
    /// Fraction of the pipeline completed, in `[0, 1]`.
    pub progress: f64,
    pub segments_translated: u32,
    pub segments_total: u32,
}

impl Job {
    /// Creates a new job in `Queued`.
    pub fn new(request: JobRequest) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            input_ref: request.input_ref,
            context_hint: request.context_hint,
            status: JobStatus::Queued,
            created_at: now,
            updated_at: now,
            stage_error: None,
            result_artifact_ref: None,
            cancel_requested: false,
            progress: 0.0,
            segments_translated: 0,
            segments_total: 0,
        }
    }

    fn transition(&mut self, to: JobStatus) {
        self.status = to;
        if let Some(progress) = to.progress_on_entry() {
            self.progress = progress;
        }
        self.updated_at = Utc::now();
    }

    /// Records how many sentences are translated so far. Only meaningful
    /// while `Translating`; returns false otherwise.
    pub fn record_translation(&mut self, translated: u32, total: u32) -> bool {
        if self.status != JobStatus::Translating {
            return false;
        }
        let translated = translated.min(total);
        self.segments_translated = translated;
        self.segments_total = total;

        let (from, to) = TRANSLATING_PROGRESS;
        let fraction = if total == 0 {
            1.0
        } else {
            f64::from(translated) / f64::from(total)
        };
        self.progress = from + (to - from) * fraction;
        self.updated_at = Utc::now();
        true
    }

    /// Moves one step along the success path. `Succeeded` is only reachable
    /// through [`succeed`](Self::succeed).
    pub fn advance(&mut self, to: JobStatus) -> Result<(), TransitionError> {
        if to.is_terminal() || self.status.next() != Some(to) {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.transition(to);
        Ok(())
    }

    /// Marks a rendered job as succeeded.
    pub fn succeed(&mut self, artifact_ref: impl Into<String>) -> Result<(), TransitionError> {
        if self.status != JobStatus::Rendering {
            return Err(TransitionError {
                from: self.status,
                to: JobStatus::Succeeded,
            });
        }
        self.result_artifact_ref = Some(artifact_ref.into());
        self.transition(JobStatus::Succeeded);
        Ok(())
    }

    pub fn fail(&mut self, failure: StageFailure) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError {
                from: self.status,
                to: JobStatus::Failed,
            });
        }
        self.stage_error = Some(failure);
        self.transition(JobStatus::Failed);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError {
                from: self.status,
                to: JobStatus::Cancelled,
            });
        }
        self.cancel_requested = true;
        self.transition(JobStatus::Cancelled);
        Ok(())
    }

    /// Flags the job for cancellation. Returns false if it already finished.
    pub fn request_cancel(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.cancel_requested = true;
        true
    }

    pub fn view(&self) -> JobStatusView {
        JobStatusView {
            id: self.id,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            progress: self.progress,
            segments_translated: self.segments_translated,
            segments_total: self.segments_total,
            error_summary: self.stage_error.as_ref().map(StageFailure::summary),
        }
    }
}

/// What status polling returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub id: JobId,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub progress: f64,
    pub segments_translated: u32,
    pub segments_total: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_summary: Option<String>,
}
