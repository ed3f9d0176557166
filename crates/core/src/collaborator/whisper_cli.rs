//! Transcriber backed by the whisper.cpp command-line tool.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::segment::RawToken;

use super::config::TranscriberConfig;
use super::error::CollaboratorError;
use super::traits::Transcriber;

/// Runs `whisper-cli` with JSON output and converts its segments to tokens.
pub struct WhisperCliTranscriber {
    config: TranscriberConfig,
}

impl WhisperCliTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    fn output_stem(audio: &Path) -> PathBuf {
        audio.with_extension("")
    }

    fn build_args(&self, audio: &Path, model: &Path) -> Vec<String> {
        let mut args = vec![
            "-m".to_string(),
            model.to_string_lossy().into_owned(),
            "-f".to_string(),
            audio.to_string_lossy().into_owned(),
            "-oj".to_string(),
            "-of".to_string(),
            Self::output_stem(audio).to_string_lossy().into_owned(),
            "-np".to_string(),
        ];
        if let Some(ref language) = self.config.language {
            args.push("-l".to_string());
            args.push(language.clone());
        }
        if let Some(threads) = self.config.threads {
            args.push("-t".to_string());
            args.push(threads.to_string());
        }
        if self.config.word_level {
            args.extend(["-ml".to_string(), "1".to_string(), "-sow".to_string()]);
        }
        args
    }
}

#[derive(Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    transcription: Vec<WhisperSegment>,
}

#[derive(Deserialize)]
struct WhisperSegment {
    offsets: WhisperOffsets,
    text: String,
}

#[derive(Deserialize)]
struct WhisperOffsets {
    from: u64,
    to: u64,
}

/// Parses whisper.cpp JSON output into tokens. Offsets are milliseconds.
pub(crate) fn parse_output(json: &str) -> Result<Vec<RawToken>, CollaboratorError> {
    let output: WhisperOutput = serde_json::from_str(json)
        .map_err(|e| CollaboratorError::permanent(format!("invalid whisper output: {}", e)))?;

    Ok(output
        .transcription
        .into_iter()
        .filter(|s| !s.text.trim().is_empty())
        .map(|s| {
            RawToken::new(
                s.offsets.from as f64 / 1000.0,
                s.offsets.to as f64 / 1000.0,
                s.text.trim(),
            )
        })
        .collect())
}

#[async_trait]
impl Transcriber for WhisperCliTranscriber {
    fn name(&self) -> &str {
        "whisper-cli"
    }

    async fn transcribe(&self, audio: &Path) -> Result<Vec<RawToken>, CollaboratorError> {
        let model = self
            .config
            .model_path
            .as_deref()
            .ok_or_else(|| CollaboratorError::permanent("no whisper model configured"))?;

        if !audio.exists() {
            return Err(CollaboratorError::permanent(format!(
                "audio file not found: {}",
                audio.display()
            )));
        }

        let args = self.build_args(audio, model);
        debug!(?args, "Running whisper-cli");

        let output = Command::new(&self.config.binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CollaboratorError::permanent(format!(
                "whisper-cli exited with {}: {}",
                output.status,
                stderr.trim().lines().last().unwrap_or_default()
            )));
        }

        let json_path = Self::output_stem(audio).with_extension("json");
        let json = tokio::fs::read_to_string(&json_path).await?;
        parse_output(&json)
    }
}
