//! Process-wide Prometheus registry for the runner.
//!
//! The job pipeline's collectors live in `subweaver_core::metrics`; this
//! module registers them once and renders the text exposition format.

use once_cell::sync::Lazy;
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for collector in subweaver_core::metrics::all_metrics() {
        if let Err(e) = registry.register(collector) {
            warn!("Failed to register metric: {}", e);
        }
    }
    registry
});

/// Encodes every registered metric in the Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use subweaver_core::metrics::JOBS_SUBMITTED;

    #[test]
    fn test_encode_includes_pipeline_metrics() {
        JOBS_SUBMITTED.inc();
        let text = encode_metrics();
        assert!(text.contains("subweaver_jobs_submitted_total"));
    }
}
