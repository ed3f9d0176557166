//! Splitter configuration.

use serde::{Deserialize, Serialize};

/// How sentence boundaries are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// Terminal punctuation closes a sentence.
    #[default]
    Punctuation,
    /// A boundary oracle decides, window by window.
    Assisted,
}

/// Configuration for the sentence splitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Boundary policy.
    #[serde(default)]
    pub mode: SplitMode,

    /// Characters that end a sentence when they end a token.
    #[serde(default = "default_terminal_punctuation")]
    pub terminal_punctuation: String,

    /// A single token longer than this (seconds) is emitted on its own.
    /// 0 disables the check.
    #[serde(default = "default_max_token_duration")]
    pub max_token_duration_secs: f64,

    /// Force a boundary after this many tokens (0 = unlimited).
    #[serde(default = "default_max_sentence_tokens")]
    pub max_sentence_tokens: usize,

    /// Tokens per oracle request in assisted mode.
    #[serde(default = "default_assist_window")]
    pub assist_window_tokens: usize,
}

fn default_terminal_punctuation() -> String {
    ".?!。？！…".to_string()
}

fn default_max_token_duration() -> f64 {
    10.0
}

fn default_max_sentence_tokens() -> usize {
    100
}

fn default_assist_window() -> usize {
    200
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            mode: SplitMode::default(),
            terminal_punctuation: default_terminal_punctuation(),
            max_token_duration_secs: default_max_token_duration(),
            max_sentence_tokens: default_max_sentence_tokens(),
            assist_window_tokens: default_assist_window(),
        }
    }
}

impl SplitterConfig {
    /// Sets the boundary policy.
    pub fn with_mode(mut self, mode: SplitMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the standalone-token duration threshold.
    pub fn with_max_token_duration(mut self, secs: f64) -> Self {
        self.max_token_duration_secs = secs;
        self
    }

    /// Sets the forced boundary token count.
    pub fn with_max_sentence_tokens(mut self, max: usize) -> Self {
        self.max_sentence_tokens = max;
        self
    }
}
