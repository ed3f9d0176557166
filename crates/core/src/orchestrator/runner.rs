//! Job orchestrator implementation.
//!
//! Drives one job through Fetching, Transcribing, Translating and Rendering.
//! Stages run strictly in sequence; only the translation sub-stage fans out.

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::collaborator::{NeighborContext, TranslationRequest};
use crate::executor::{
    ArtifactWriter, BoundaryExecutor, FetchExecutor, StageContext, StageExecutor, StageRunner,
    TranscribeExecutor, TranslateExecutor,
};
use crate::job::{ErrorKind, Job, JobHandle, JobStatus, JobStore, StageFailure};
use crate::metrics;
use crate::render::{render_srt, split_long_cues};
use crate::segment::{RawToken, TimedSegment};
use crate::splitter::{SentenceSplitter, SplitMode};
use crate::storage::ArtifactKey;

use super::config::{OrchestratorConfig, TranslationConfig};
use super::types::{Collaborators, OrchestratorError};

/// Name of the final artifact within the rendering stage.
pub const SUBTITLE_ARTIFACT: &str = "subtitles.srt";

/// Runs jobs through the pipeline. One instance is shared by every job;
/// all per-job state lives in the job's [`JobHandle`] and on the stack.
pub struct JobOrchestrator {
    fetch: FetchExecutor,
    transcribe: TranscribeExecutor,
    translate: TranslateExecutor,
    boundaries: Option<BoundaryExecutor>,
    writer: ArtifactWriter,
    splitter: SentenceSplitter,
    translation: TranslationConfig,
    job_store: Arc<dyn JobStore>,
}

impl JobOrchestrator {
    pub fn new(config: OrchestratorConfig, collaborators: Collaborators) -> Self {
        let retry = config.retry;
        let timeouts = config.executor;

        let runner = |name: &str, timeout| StageRunner::new(name, retry.clone(), timeout);

        let boundaries = match (config.splitter.mode, collaborators.boundary_oracle) {
            (SplitMode::Assisted, Some(oracle)) => Some(BoundaryExecutor::new(
                oracle.clone(),
                runner(oracle.name(), timeouts.translate_timeout()),
            )),
            (SplitMode::Assisted, None) => {
                warn!("Assisted splitting configured without a boundary oracle; using punctuation");
                None
            }
            (SplitMode::Punctuation, _) => None,
        };

        Self {
            fetch: FetchExecutor::new(
                collaborators.fetcher.clone(),
                collaborators.storage.clone(),
                runner(collaborators.fetcher.name(), timeouts.fetch_timeout()),
            ),
            transcribe: TranscribeExecutor::new(
                collaborators.transcriber.clone(),
                collaborators.storage.clone(),
                runner(collaborators.transcriber.name(), timeouts.transcribe_timeout()),
            ),
            translate: TranslateExecutor::new(
                collaborators.translator.clone(),
                runner(collaborators.translator.name(), timeouts.translate_timeout()),
            ),
            boundaries,
            writer: ArtifactWriter::new(
                collaborators.storage,
                runner("storage", timeouts.storage_timeout()),
            ),
            splitter: SentenceSplitter::new(config.splitter),
            translation: config.translation,
            job_store: collaborators.job_store,
        }
    }

    /// Runs a queued job to a terminal state and returns that state.
    ///
    /// Jobs that are not `Queued` when this is called are left untouched.
    pub async fn run(&self, handle: &JobHandle) -> JobStatus {
        let status = handle.status();
        if status != JobStatus::Queued {
            warn!(job_id = %handle.id(), %status, "Job is not queued, skipping");
            return status;
        }

        let ctx = StageContext::new(handle.id(), handle.cancel_token().clone());
        let outcome = self.drive(handle, &ctx).await;

        match outcome {
            Ok(()) => {}
            Err(OrchestratorError::Cancelled) => {
                let _ = handle.update(Job::cancel);
                info!(job_id = %handle.id(), "Job cancelled");
            }
            Err(OrchestratorError::Failed(failure)) => {
                warn!(
                    job_id = %handle.id(),
                    stage = %failure.stage,
                    collaborator = %failure.collaborator,
                    error = %failure.message,
                    "Job failed"
                );
                let _ = handle.update(|job| job.fail(failure));
            }
            Err(OrchestratorError::Transition(e)) => {
                warn!(job_id = %handle.id(), error = %e, "Job hit an invalid transition");
                let stage = handle.status();
                let _ = handle.update(|job| {
                    job.fail(StageFailure::new(
                        stage,
                        "orchestrator",
                        ErrorKind::Permanent,
                        e.to_string(),
                    ))
                });
            }
        }

        self.persist(handle);
        let finished = handle.status();
        metrics::JOBS_FINISHED
            .with_label_values(&[&finished.as_str().to_lowercase()])
            .inc();
        finished
    }

    async fn drive(&self, handle: &JobHandle, ctx: &StageContext) -> Result<(), OrchestratorError> {
        let job = handle.snapshot();

        let started = self.enter(handle, JobStatus::Fetching)?;
        let audio = self
            .fetch
            .execute(ctx, &job.input_ref)
            .await
            .map_err(|e| OrchestratorError::from_executor(JobStatus::Fetching, e))?;
        observe(JobStatus::Fetching, started);

        let started = self.enter(handle, JobStatus::Transcribing)?;
        let tokens = self
            .transcribe
            .execute(ctx, &audio)
            .await
            .map_err(|e| OrchestratorError::from_executor(JobStatus::Transcribing, e))?;
        observe(JobStatus::Transcribing, started);

        let started = self.enter(handle, JobStatus::Translating)?;
        let sentences = self.split(ctx, &tokens).await?;
        let translated = self.translate_all(ctx, handle, &job, sentences).await?;
        self.write_sentences(ctx, &translated).await?;
        observe(JobStatus::Translating, started);

        let started = self.enter(handle, JobStatus::Rendering)?;
        let sentence_count = translated.len();
        let cues = split_long_cues(translated, self.translation.max_cue_chars);
        debug!(
            job_id = %ctx.job_id,
            sentences = sentence_count,
            cues = cues.len(),
            "Laid out cues"
        );
        let srt = render_srt(&cues).map_err(|e| {
            OrchestratorError::Failed(StageFailure::new(
                JobStatus::Rendering,
                "renderer",
                ErrorKind::InvalidRange,
                e.to_string(),
            ))
        })?;
        let key = ArtifactKey::for_stage(
            &ctx.job_id.to_string(),
            JobStatus::Rendering.as_str(),
            SUBTITLE_ARTIFACT,
        );
        self.writer
            .write(ctx, &key, srt.as_bytes())
            .await
            .map_err(|e| OrchestratorError::from_executor(JobStatus::Rendering, e))?;
        observe(JobStatus::Rendering, started);

        handle.update(|job| job.succeed(key.as_str()))?;
        info!(job_id = %ctx.job_id, artifact = %key, cues = cues.len(), "Job succeeded");
        Ok(())
    }

    /// Checks for a cancel request and advances, as one atomic step.
    fn enter(&self, handle: &JobHandle, next: JobStatus) -> Result<Instant, OrchestratorError> {
        handle.update(|job| {
            if job.cancel_requested {
                return Err(OrchestratorError::Cancelled);
            }
            job.advance(next).map_err(OrchestratorError::from)
        })?;

        info!(job_id = %handle.id(), stage = %next, "Entering stage");
        self.persist(handle);
        Ok(Instant::now())
    }

    fn persist(&self, handle: &JobHandle) {
        if let Err(e) = self.job_store.save(&handle.snapshot()) {
            warn!(job_id = %handle.id(), error = %e, "Failed to persist job record");
        }
    }

    async fn split(
        &self,
        ctx: &StageContext,
        tokens: &[RawToken],
    ) -> Result<Vec<TimedSegment>, OrchestratorError> {
        let sentences: Result<Vec<TimedSegment>, _> = match self.boundaries {
            Some(ref oracle) => {
                let boundaries = self
                    .splitter
                    .assisted_boundaries(tokens, move |window| async move {
                        oracle.execute(ctx, &window).await
                    })
                    .await
                    .map_err(|e| OrchestratorError::from_executor(JobStatus::Translating, e))?;
                self.splitter.split_at(tokens, &boundaries).collect()
            }
            None => self.splitter.split(tokens).collect(),
        };

        let sentences: Vec<TimedSegment> = sentences
            .map_err(|e| {
                OrchestratorError::Failed(StageFailure::new(
                    JobStatus::Translating,
                    "splitter",
                    ErrorKind::InvalidRange,
                    e.to_string(),
                ))
            })?
            .into_iter()
            .filter(|s| !s.source_text.trim().is_empty())
            .collect();

        debug!(
            job_id = %ctx.job_id,
            tokens = tokens.len(),
            sentences = sentences.len(),
            "Split transcript"
        );
        Ok(sentences)
    }

    /// Translates every sentence in ordered batches of `fan_out`.
    ///
    /// Results are written into a slot per sentence index, so completion
    /// order never affects the output. Neighbor context only comes from
    /// batches that already finished.
    ///
    /// Progress is recorded on the handle per sentence and persisted once
    /// per batch.
    async fn translate_all(
        &self,
        ctx: &StageContext,
        handle: &JobHandle,
        job: &Job,
        sentences: Vec<TimedSegment>,
    ) -> Result<Vec<TimedSegment>, OrchestratorError> {
        let fan_out = self.translation.fan_out.max(1);
        let mut translated: Vec<Option<String>> = vec![None; sentences.len()];
        let indices: Vec<usize> = (0..sentences.len()).collect();
        let total = u32::try_from(sentences.len()).unwrap_or(u32::MAX);
        let mut done: u32 = 0;

        handle.update(|job| job.record_translation(done, total));
        self.persist(handle);

        for batch in indices.chunks(fan_out) {
            let batch_start = batch[0];
            let executor = &self.translate;
            let mut pending = FuturesUnordered::new();

            for &index in batch {
                let request = TranslationRequest {
                    text: sentences[index].source_text.clone(),
                    context_hint: job.context_hint.clone(),
                    neighbors: self.neighbors(&sentences, &translated, batch_start),
                    target_language: self.translation.target_language.clone(),
                };
                pending.push(async move { (index, executor.execute(ctx, &request).await) });
            }

            while let Some((index, result)) = pending.next().await {
                let text = result
                    .map_err(|e| OrchestratorError::from_executor(JobStatus::Translating, e))?;
                translated[index] = Some(text);
                metrics::SEGMENTS_TRANSLATED.inc();
                done = done.saturating_add(1);
                handle.update(|job| job.record_translation(done, total));
            }
            self.persist(handle);
        }

        Ok(sentences
            .into_iter()
            .zip(translated)
            .map(|(sentence, text)| match text {
                Some(text) => sentence.with_translation(text),
                None => sentence,
            })
            .collect())
    }

    fn neighbors(
        &self,
        sentences: &[TimedSegment],
        translated: &[Option<String>],
        before: usize,
    ) -> Vec<NeighborContext> {
        let mut neighbors: Vec<NeighborContext> = (0..before)
            .rev()
            .filter_map(|i| {
                translated[i].as_ref().map(|t| NeighborContext {
                    source: sentences[i].source_text.clone(),
                    translated: t.clone(),
                })
            })
            .take(self.translation.neighbor_window)
            .collect();
        neighbors.reverse();
        neighbors
    }

    async fn write_sentences(
        &self,
        ctx: &StageContext,
        sentences: &[TimedSegment],
    ) -> Result<(), OrchestratorError> {
        let bytes = serde_json::to_vec_pretty(sentences).map_err(|e| {
            OrchestratorError::Failed(StageFailure::new(
                JobStatus::Translating,
                "storage",
                ErrorKind::Permanent,
                e.to_string(),
            ))
        })?;
        let key = ArtifactKey::for_stage(
            &ctx.job_id.to_string(),
            JobStatus::Translating.as_str(),
            "sentences.json",
        );
        self.writer
            .write(ctx, &key, &bytes)
            .await
            .map_err(|e| OrchestratorError::from_executor(JobStatus::Translating, e))
    }
}

fn observe(stage: JobStatus, started: Instant) {
    metrics::STAGE_DURATION
        .with_label_values(&[stage.as_str()])
        .observe(started.elapsed().as_secs_f64());
}
