//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

use crate::executor::{ExecutorConfig, RetryConfig};
use crate::splitter::SplitterConfig;

/// Translation sub-stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Sentences translated concurrently per job.
    /// Batches of this size run one after another.
    #[serde(default = "default_fan_out")]
    pub fan_out: usize,

    /// Already-translated preceding sentences passed along as context.
    /// Only sentences from earlier batches qualify.
    #[serde(default = "default_neighbor_window")]
    pub neighbor_window: usize,

    /// Target language tag passed to the translator.
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translated sentences longer than this many characters are shown as
    /// several cues, timed by character share. 0 keeps sentences whole.
    #[serde(default = "default_max_cue_chars")]
    pub max_cue_chars: usize,
}

fn default_fan_out() -> usize {
    5
}

fn default_neighbor_window() -> usize {
    2
}

fn default_target_language() -> String {
    "zh-CN".to_string()
}

fn default_max_cue_chars() -> usize {
    42
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            fan_out: default_fan_out(),
            neighbor_window: default_neighbor_window(),
            target_language: default_target_language(),
            max_cue_chars: default_max_cue_chars(),
        }
    }
}

impl TranslationConfig {
    pub fn with_fan_out(mut self, fan_out: usize) -> Self {
        self.fan_out = fan_out;
        self
    }

    pub fn with_neighbor_window(mut self, window: usize) -> Self {
        self.neighbor_window = window;
        self
    }

    pub fn with_max_cue_chars(mut self, max_cue_chars: usize) -> Self {
        self.max_cue_chars = max_cue_chars;
        self
    }
}

/// Everything the orchestrator needs besides its collaborators.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    pub retry: RetryConfig,
    pub executor: ExecutorConfig,
    pub splitter: SplitterConfig,
    pub translation: TranslationConfig,
}

impl OrchestratorConfig {
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_splitter(mut self, splitter: SplitterConfig) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_translation(mut self, translation: TranslationConfig) -> Self {
        self.translation = translation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_translation_config() {
        let config = TranslationConfig::default();
        assert_eq!(config.fan_out, 5);
        assert_eq!(config.neighbor_window, 2);
        assert_eq!(config.target_language, "zh-CN");
        assert_eq!(config.max_cue_chars, 42);
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
            fan_out = 1
        "#;
        let config: TranslationConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.fan_out, 1);
        assert_eq!(config.neighbor_window, 2);
        assert_eq!(config.max_cue_chars, 42);
    }
}
