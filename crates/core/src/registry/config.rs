//! Scheduler configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the job registry and scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Jobs allowed to execute stages at the same time.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// How long finished jobs stay in memory (seconds).
    #[serde(default = "default_retention")]
    pub retention_secs: u64,

    /// How often the sweeper looks for expired jobs (milliseconds).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_ms: u64,

    /// Longest context hint accepted at submission (characters).
    #[serde(default = "default_max_context_hint_chars")]
    pub max_context_hint_chars: usize,
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_retention() -> u64 {
    3600 // 1 hour
}

fn default_sweep_interval() -> u64 {
    30_000 // 30 seconds
}

fn default_max_context_hint_chars() -> usize {
    2000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            retention_secs: default_retention(),
            sweep_interval_ms: default_sweep_interval(),
            max_context_hint_chars: default_max_context_hint_chars(),
        }
    }
}

impl SchedulerConfig {
    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self
    }

    pub fn with_retention_secs(mut self, secs: u64) -> Self {
        self.retention_secs = secs;
        self
    }

    pub fn with_sweep_interval_ms(mut self, ms: u64) -> Self {
        self.sweep_interval_ms = ms;
        self
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}
