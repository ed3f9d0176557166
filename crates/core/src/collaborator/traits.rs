//! Collaborator traits.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::segment::RawToken;

use super::error::CollaboratorError;
use super::types::{FetchRequest, TranslationRequest};

/// Downloads media and extracts its audio track to a local file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Name used in logs and failure records.
    fn name(&self) -> &str;

    /// Returns the path of the extracted audio file.
    async fn fetch(&self, request: &FetchRequest) -> Result<PathBuf, CollaboratorError>;
}

/// Speech recognition: audio in, timestamped source-language tokens out.
#[async_trait]
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &str;

    /// Returns tokens ordered by start time.
    async fn transcribe(&self, audio: &Path) -> Result<Vec<RawToken>, CollaboratorError>;
}

/// Machine translation of one sentence.
#[async_trait]
pub trait Translator: Send + Sync {
    fn name(&self) -> &str;

    async fn translate(&self, request: &TranslationRequest) -> Result<String, CollaboratorError>;
}

/// Language-model-assisted sentence boundary detection.
#[async_trait]
pub trait BoundaryOracle: Send + Sync {
    fn name(&self) -> &str;

    /// Given a window of token texts, returns the indices (within the
    /// window) of tokens that end a sentence.
    async fn boundaries(&self, window: &[String]) -> Result<Vec<usize>, CollaboratorError>;
}
