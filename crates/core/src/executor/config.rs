use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-call timeouts for each collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_transcribe_timeout")]
    pub transcribe_timeout_secs: u64,

    #[serde(default = "default_translate_timeout")]
    pub translate_timeout_secs: u64,

    #[serde(default = "default_storage_timeout")]
    pub storage_timeout_secs: u64,
}

fn default_fetch_timeout() -> u64 {
    600
}

fn default_transcribe_timeout() -> u64 {
    1200
}

fn default_translate_timeout() -> u64 {
    120
}

fn default_storage_timeout() -> u64 {
    60
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout(),
            transcribe_timeout_secs: default_transcribe_timeout(),
            translate_timeout_secs: default_translate_timeout(),
            storage_timeout_secs: default_storage_timeout(),
        }
    }
}

impl ExecutorConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn transcribe_timeout(&self) -> Duration {
        Duration::from_secs(self.transcribe_timeout_secs)
    }

    pub fn translate_timeout(&self) -> Duration {
        Duration::from_secs(self.translate_timeout_secs)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_secs)
    }
}
