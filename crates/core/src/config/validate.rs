use super::{types::Config, ConfigError};

/// Upper bound for `scheduler.retention_secs` (100 years).
pub const MAX_RETENTION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Validate configuration
/// Currently validates:
/// - At least one job may run at a time
/// - Retention fits the timestamp range
/// - Retry policy is well-formed
/// - Translation fan-out is at least 1
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.scheduler.max_concurrent_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.max_concurrent_jobs must be at least 1".to_string(),
        ));
    }

    if config.scheduler.retention_secs > MAX_RETENTION_SECS {
        return Err(ConfigError::ValidationError(format!(
            "scheduler.retention_secs must be at most {}",
            MAX_RETENTION_SECS
        )));
    }

    if config.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "retry.max_attempts must be at least 1".to_string(),
        ));
    }

    let multiplier = config.retry.backoff_multiplier;
    if multiplier.is_nan() || multiplier < 1.0 {
        return Err(ConfigError::ValidationError(
            "retry.backoff_multiplier must be >= 1.0".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.retry.jitter_ratio) {
        return Err(ConfigError::ValidationError(
            "retry.jitter_ratio must be within [0, 1]".to_string(),
        ));
    }

    if config.retry.initial_delay_ms > config.retry.max_delay_ms {
        return Err(ConfigError::ValidationError(
            "retry.initial_delay_ms cannot exceed retry.max_delay_ms".to_string(),
        ));
    }

    if config.translation.fan_out == 0 {
        return Err(ConfigError::ValidationError(
            "translation.fan_out must be at least 1".to_string(),
        ));
    }

    Ok(())
}
