//! Job registry and scheduler.
//!
//! Admission control and lookup:
//! - at most `max_concurrent_jobs` jobs execute stages at once
//! - waiting jobs are admitted in submission order
//! - finished jobs stay queryable for `retention_secs`, then are evicted;
//!   lookups for evicted jobs fall back to the job store

mod config;
mod scheduler;
mod types;

pub use config::SchedulerConfig;
pub use scheduler::JobRegistry;
pub use types::{RegistryError, RegistrySummary};
