//! Prometheus metrics for the pipeline.
//!
//! This module provides metrics for:
//! - Registry (submissions, admissions, finished jobs)
//! - Orchestrator (stage durations, translated segments)
//! - Executors (collaborator retries)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Registry
// =============================================================================

/// Jobs accepted by `submit`.
pub static JOBS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("subweaver_jobs_submitted_total", "Total jobs submitted").unwrap()
});

/// Jobs that reached a terminal state, by result.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("subweaver_jobs_finished_total", "Total jobs finished"),
        &["result"], // "succeeded", "failed", "cancelled"
    )
    .unwrap()
});

/// Jobs currently running stages.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("subweaver_jobs_active", "Jobs currently executing stages").unwrap()
});

/// Jobs waiting for a slot.
pub static JOBS_QUEUED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("subweaver_jobs_queued", "Jobs waiting for admission").unwrap()
});

// =============================================================================
// Orchestrator
// =============================================================================

/// Time spent in each stage.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("subweaver_stage_duration_seconds", "Duration of pipeline stages")
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0, 1800.0]),
        &["stage"],
    )
    .unwrap()
});

/// Sentences translated.
pub static SEGMENTS_TRANSLATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "subweaver_segments_translated_total",
        "Total sentence segments translated",
    )
    .unwrap()
});

// =============================================================================
// Executors
// =============================================================================

/// Retries after transient collaborator failures.
pub static COLLABORATOR_RETRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "subweaver_collaborator_retries_total",
            "Retries after transient collaborator failures",
        ),
        &["collaborator"],
    )
    .unwrap()
});

/// Returns all metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOBS_ACTIVE.clone()),
        Box::new(JOBS_QUEUED.clone()),
        Box::new(STAGE_DURATION.clone()),
        Box::new(SEGMENTS_TRANSLATED.clone()),
        Box::new(COLLABORATOR_RETRIES.clone()),
    ]
}
