//! Audio fetcher backed by yt-dlp.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::config::FetcherConfig;
use super::error::CollaboratorError;
use super::traits::Fetcher;
use super::types::FetchRequest;

/// Downloads a video with yt-dlp and extracts its audio track.
///
/// Each job gets its own directory under `work_dir`, so repeated attempts for
/// the same job overwrite the same file.
pub struct YtDlpFetcher {
    config: FetcherConfig,
}

impl YtDlpFetcher {
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    fn job_dir(&self, job_id: &str) -> PathBuf {
        self.config.work_dir.join(job_id)
    }

    fn build_args(&self, request: &FetchRequest) -> Vec<String> {
        let template = self.job_dir(&request.job_id).join("audio.%(ext)s");
        let mut args = vec![
            "-x".to_string(),
            "--audio-format".to_string(),
            self.config.audio_format.clone(),
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
        ];
        args.extend(self.config.extra_args.iter().cloned());
        args.push("--".to_string());
        args.push(request.source.clone());
        args
    }

    fn expected_output(&self, job_id: &str) -> PathBuf {
        self.job_dir(job_id)
            .join(format!("audio.{}", self.config.audio_format))
    }
}

/// Classifies a yt-dlp failure from its stderr output.
fn classify_failure(stderr: &str) -> CollaboratorError {
    let lower = stderr.to_lowercase();
    let transient_markers = [
        "http error 429",
        "http error 5",
        "timed out",
        "temporary failure",
        "connection reset",
        "unable to download webpage",
    ];
    let message = stderr.trim().lines().last().unwrap_or("yt-dlp failed").to_string();
    if transient_markers.iter().any(|m| lower.contains(m)) {
        CollaboratorError::transient(message)
    } else {
        CollaboratorError::permanent(message)
    }
}

#[async_trait]
impl Fetcher for YtDlpFetcher {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<PathBuf, CollaboratorError> {
        if request.source.trim().is_empty() {
            return Err(CollaboratorError::permanent("empty source"));
        }

        tokio::fs::create_dir_all(self.job_dir(&request.job_id)).await?;

        let args = self.build_args(request);
        debug!(job_id = %request.job_id, ?args, "Running yt-dlp");

        let output = Command::new(&self.config.binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(&stderr));
        }

        let path = self.expected_output(&request.job_id);
        if !Path::new(&path).exists() {
            return Err(CollaboratorError::permanent(format!(
                "yt-dlp reported success but {} is missing",
                path.display()
            )));
        }
        Ok(path)
    }
}
