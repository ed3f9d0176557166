//! The concrete stage executors.

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::collaborator::{
    BoundaryOracle, CollaboratorError, FetchRequest, Fetcher, Transcriber, TranslationRequest,
    Translator,
};
use crate::segment::RawToken;
use crate::storage::{ArtifactKey, ArtifactStorage};

use super::error::ExecutorError;
use super::stage::{StageContext, StageRunner};

/// Uniform contract for one retry-wrapped pipeline stage.
#[async_trait]
pub trait StageExecutor: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;

    /// Name of the wrapped collaborator, recorded on failures.
    fn collaborator(&self) -> &str;

    async fn execute(
        &self,
        ctx: &StageContext,
        input: &Self::Input,
    ) -> Result<Self::Output, ExecutorError>;
}

#[derive(Serialize)]
struct FetchManifest<'a> {
    source: &'a str,
    audio_path: String,
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>, CollaboratorError> {
    serde_json::to_vec_pretty(value).map_err(|e| CollaboratorError::permanent(e.to_string()))
}

/// Downloads the source and records a manifest under `fetching/source.json`.
pub struct FetchExecutor {
    fetcher: Arc<dyn Fetcher>,
    storage: Arc<dyn ArtifactStorage>,
    runner: StageRunner,
}

impl FetchExecutor {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<dyn ArtifactStorage>,
        runner: StageRunner,
    ) -> Self {
        Self {
            fetcher,
            storage,
            runner,
        }
    }
}

#[async_trait]
impl StageExecutor for FetchExecutor {
    type Input = String;
    type Output = PathBuf;

    fn collaborator(&self) -> &str {
        self.runner.collaborator()
    }

    async fn execute(&self, ctx: &StageContext, source: &String) -> Result<PathBuf, ExecutorError> {
        let request = FetchRequest {
            job_id: ctx.job_id.to_string(),
            source: source.clone(),
        };
        let key = ArtifactKey::for_stage(&request.job_id, "fetching", "source.json");
        let (fetcher, storage, request, key) = (&self.fetcher, &self.storage, &request, &key);

        self.runner
            .run(ctx, move |_| async move {
                let audio = fetcher.fetch(request).await?;
                let manifest = FetchManifest {
                    source: &request.source,
                    audio_path: audio.display().to_string(),
                };
                storage.write(key, &to_json(&manifest)?).await?;
                Ok::<_, CollaboratorError>(audio)
            })
            .await
    }
}

/// Transcribes audio and stores the raw tokens under
/// `transcribing/transcript.json`.
pub struct TranscribeExecutor {
    transcriber: Arc<dyn Transcriber>,
    storage: Arc<dyn ArtifactStorage>,
    runner: StageRunner,
}

impl TranscribeExecutor {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        storage: Arc<dyn ArtifactStorage>,
        runner: StageRunner,
    ) -> Self {
        Self {
            transcriber,
            storage,
            runner,
        }
    }
}

#[async_trait]
impl StageExecutor for TranscribeExecutor {
    type Input = PathBuf;
    type Output = Vec<RawToken>;

    fn collaborator(&self) -> &str {
        self.runner.collaborator()
    }

    async fn execute(
        &self,
        ctx: &StageContext,
        audio: &PathBuf,
    ) -> Result<Vec<RawToken>, ExecutorError> {
        let key =
            ArtifactKey::for_stage(&ctx.job_id.to_string(), "transcribing", "transcript.json");
        let (transcriber, storage, key) = (&self.transcriber, &self.storage, &key);

        let tokens = self
            .runner
            .run(ctx, move |_| async move {
                let tokens = transcriber.transcribe(audio).await?;
                storage.write(key, &to_json(&tokens)?).await?;
                Ok::<_, CollaboratorError>(tokens)
            })
            .await?;

        debug!(job_id = %ctx.job_id, tokens = tokens.len(), "Transcribed");
        Ok(tokens)
    }
}

/// Translates one sentence.
pub struct TranslateExecutor {
    translator: Arc<dyn Translator>,
    runner: StageRunner,
}

impl TranslateExecutor {
    pub fn new(translator: Arc<dyn Translator>, runner: StageRunner) -> Self {
        Self { translator, runner }
    }
}

#[async_trait]
impl StageExecutor for TranslateExecutor {
    type Input = TranslationRequest;
    type Output = String;

    fn collaborator(&self) -> &str {
        self.runner.collaborator()
    }

    async fn execute(
        &self,
        ctx: &StageContext,
        request: &TranslationRequest,
    ) -> Result<String, ExecutorError> {
        let translator = &self.translator;
        self.runner
            .run(ctx, move |_| async move { translator.translate(request).await })
            .await
    }
}

/// Asks a boundary oracle for sentence ends within one token window.
pub struct BoundaryExecutor {
    oracle: Arc<dyn BoundaryOracle>,
    runner: StageRunner,
}

impl BoundaryExecutor {
    pub fn new(oracle: Arc<dyn BoundaryOracle>, runner: StageRunner) -> Self {
        Self { oracle, runner }
    }
}

#[async_trait]
impl StageExecutor for BoundaryExecutor {
    type Input = Vec<String>;
    type Output = Vec<usize>;

    fn collaborator(&self) -> &str {
        self.runner.collaborator()
    }

    async fn execute(
        &self,
        ctx: &StageContext,
        window: &Vec<String>,
    ) -> Result<Vec<usize>, ExecutorError> {
        let oracle = &self.oracle;
        self.runner
            .run(ctx, move |_| async move { oracle.boundaries(window).await })
            .await
    }
}

/// Writes an artifact under the storage retry policy.
pub struct ArtifactWriter {
    storage: Arc<dyn ArtifactStorage>,
    runner: StageRunner,
}

impl ArtifactWriter {
    pub fn new(storage: Arc<dyn ArtifactStorage>, runner: StageRunner) -> Self {
        Self { storage, runner }
    }

    pub fn collaborator(&self) -> &str {
        self.runner.collaborator()
    }

    pub async fn write(
        &self,
        ctx: &StageContext,
        key: &ArtifactKey,
        bytes: &[u8],
    ) -> Result<(), ExecutorError> {
        let storage = &self.storage;
        self.runner
            .run(ctx, move |_| async move {
                storage.write(key, bytes).await?;
                Ok::<_, CollaboratorError>(())
            })
            .await
    }
}
