//! Configuration for the real collaborator adapters.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the yt-dlp fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_ytdlp_path")]
    pub binary: PathBuf,

    /// Audio format to extract (passed to `--audio-format`).
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Directory holding one work directory per job.
    #[serde(default = "default_fetch_dir")]
    pub work_dir: PathBuf,

    /// Additional yt-dlp arguments.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_audio_format() -> String {
    "wav".to_string()
}

fn default_fetch_dir() -> PathBuf {
    std::env::temp_dir().join("subweaver-fetch")
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            binary: default_ytdlp_path(),
            audio_format: default_audio_format(),
            work_dir: default_fetch_dir(),
            extra_args: Vec::new(),
        }
    }
}

/// Configuration for the whisper.cpp CLI transcriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Path to the whisper.cpp CLI binary.
    #[serde(default = "default_whisper_path")]
    pub binary: PathBuf,

    /// Path to the ggml model file.
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// Spoken language code; `None` lets whisper auto-detect.
    #[serde(default)]
    pub language: Option<String>,

    /// Emit one token per word (`-ml 1 -sow`) instead of whole phrases.
    #[serde(default = "default_word_level")]
    pub word_level: bool,

    /// Thread count passed to whisper (`-t`).
    #[serde(default)]
    pub threads: Option<u32>,
}

fn default_whisper_path() -> PathBuf {
    PathBuf::from("whisper-cli")
}

fn default_word_level() -> bool {
    true
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            binary: default_whisper_path(),
            model_path: None,
            language: None,
            word_level: default_word_level(),
            threads: None,
        }
    }
}

/// Configuration for the OpenAI-compatible translator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// API base URL, without the `/chat/completions` suffix.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Bearer token. Optional for local servers.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate per request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}
