//! Error types for the segment model.

use thiserror::Error;

/// Structural violations of segment timing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentError {
    /// End precedes start, or a bound is not a finite number.
    #[error("invalid time range: start {start}s, end {end}s")]
    InvalidRange { start: f64, end: f64 },
}

impl SegmentError {
    pub(crate) fn invalid_range(start: f64, end: f64) -> Self {
        Self::InvalidRange { start, end }
    }
}
