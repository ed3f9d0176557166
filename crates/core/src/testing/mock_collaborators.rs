//! Mock collaborators for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::collaborator::{
    BoundaryOracle, CollaboratorError, FetchRequest, Fetcher, Transcriber, TranslationRequest,
    Translator,
};
use crate::segment::RawToken;

use super::fixtures;
use super::script::Script;

/// Mock implementation of the Fetcher trait.
///
/// Returns `/mock/{job_id}/audio.wav` and records every request.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    script: Script,
    requests: Arc<RwLock<Vec<FetchRequest>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Failure and blocking controls.
    pub fn script(&self) -> &Script {
        &self.script
    }

    pub async fn recorded_requests(&self) -> Vec<FetchRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock-fetcher"
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<PathBuf, CollaboratorError> {
        self.requests.write().await.push(request.clone());
        self.script.enter().await?;
        Ok(PathBuf::from(format!("/mock/{}/audio.wav", request.job_id)))
    }
}

/// Mock implementation of the Transcriber trait.
///
/// Returns [`fixtures::tokens`] unless configured otherwise.
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    script: Script,
    tokens: Arc<RwLock<Vec<RawToken>>>,
    calls: Arc<RwLock<Vec<PathBuf>>>,
}

impl Default for MockTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscriber {
    pub fn new() -> Self {
        Self {
            script: Script::new(),
            tokens: Arc::new(RwLock::new(fixtures::tokens())),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Set the tokens returned by every call.
    pub async fn set_tokens(&self, tokens: Vec<RawToken>) {
        *self.tokens.write().await = tokens;
    }

    pub async fn recorded_paths(&self) -> Vec<PathBuf> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    fn name(&self) -> &str {
        "mock-transcriber"
    }

    async fn transcribe(&self, audio: &Path) -> Result<Vec<RawToken>, CollaboratorError> {
        self.calls.write().await.push(audio.to_path_buf());
        self.script.enter().await?;
        Ok(self.tokens.read().await.clone())
    }
}

/// Mock implementation of the Translator trait.
///
/// Translates `text` to `"[{target_language}] {text}"` unless an explicit
/// translation was registered. Per-text delays make completion order
/// differ from submission order.
#[derive(Debug, Clone, Default)]
pub struct MockTranslator {
    script: Script,
    translations: Arc<RwLock<HashMap<String, String>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    requests: Arc<RwLock<Vec<TranslationRequest>>>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub async fn set_translation(&self, source: impl Into<String>, translated: impl Into<String>) {
        self.translations
            .write()
            .await
            .insert(source.into(), translated.into());
    }

    /// Delay the reply for `source` by `delay`.
    pub async fn set_delay(&self, source: impl Into<String>, delay: Duration) {
        self.delays.write().await.insert(source.into(), delay);
    }

    /// Requests in the order the calls started.
    pub async fn recorded_requests(&self) -> Vec<TranslationRequest> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn name(&self) -> &str {
        "mock-translator"
    }

    async fn translate(&self, request: &TranslationRequest) -> Result<String, CollaboratorError> {
        self.requests.write().await.push(request.clone());
        self.script.enter().await?;

        let delay = self.delays.read().await.get(&request.text).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let translated = self.translations.read().await.get(&request.text).cloned();
        Ok(translated
            .unwrap_or_else(|| format!("[{}] {}", request.target_language, request.text)))
    }
}

/// Mock implementation of the BoundaryOracle trait.
///
/// By default a token ends a sentence when it ends with `;`, which lets
/// tests tell assisted splitting apart from punctuation splitting.
#[derive(Debug, Clone, Default)]
pub struct MockBoundaryOracle {
    script: Script,
    windows: Arc<RwLock<Vec<Vec<String>>>>,
}

impl MockBoundaryOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub async fn recorded_windows(&self) -> Vec<Vec<String>> {
        self.windows.read().await.clone()
    }
}

#[async_trait]
impl BoundaryOracle for MockBoundaryOracle {
    fn name(&self) -> &str {
        "mock-oracle"
    }

    async fn boundaries(&self, window: &[String]) -> Result<Vec<usize>, CollaboratorError> {
        self.windows.write().await.push(window.to_vec());
        self.script.enter().await?;
        Ok(window
            .iter()
            .enumerate()
            .filter(|(_, t)| t.trim_end().ends_with(';'))
            .map(|(i, _)| i)
            .collect())
    }
}
