use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::collaborator::{FetcherConfig, TranscriberConfig, TranslatorConfig};
use crate::executor::{ExecutorConfig, RetryConfig};
use crate::orchestrator::{OrchestratorConfig, TranslationConfig};
use crate::registry::SchedulerConfig;
use crate::splitter::SplitterConfig;

/// Root configuration. Every section has defaults, so an empty file is valid.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub splitter: SplitterConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub transcriber: TranscriberConfig,
    #[serde(default)]
    pub translator: TranslatorConfig,
}

impl Config {
    /// The orchestrator's slice of the configuration.
    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            retry: self.retry.clone(),
            executor: self.executor.clone(),
            splitter: self.splitter.clone(),
            translation: self.translation.clone(),
        }
    }
}

/// Artifact storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory for stored artifacts.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("artifacts")
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("subweaver.db")
}

/// Config safe to log or print (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub scheduler: SchedulerConfig,
    pub retry: RetryConfig,
    pub executor: ExecutorConfig,
    pub splitter: SplitterConfig,
    pub translation: TranslationConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub fetcher: FetcherConfig,
    pub transcriber: TranscriberConfig,
    pub translator: SanitizedTranslatorConfig,
}

/// Translator config with the API key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTranslatorConfig {
    pub api_base: String,
    pub api_key_configured: bool,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            scheduler: config.scheduler.clone(),
            retry: config.retry.clone(),
            executor: config.executor.clone(),
            splitter: config.splitter.clone(),
            translation: config.translation.clone(),
            storage: config.storage.clone(),
            database: config.database.clone(),
            fetcher: config.fetcher.clone(),
            transcriber: config.transcriber.clone(),
            translator: SanitizedTranslatorConfig {
                api_base: config.translator.api_base.clone(),
                api_key_configured: config
                    .translator
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
                model: config.translator.model.clone(),
                temperature: config.translator.temperature,
                max_tokens: config.translator.max_tokens,
            },
        }
    }
}
