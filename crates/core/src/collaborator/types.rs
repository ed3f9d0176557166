//! Request types passed to collaborators.

use serde::{Deserialize, Serialize};

/// A request to fetch the audio for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Job the audio belongs to. Adapters use it to pick a stable work path.
    pub job_id: String,
    /// Source locator (usually a video URL).
    pub source: String,
}

/// A neighboring segment that has already been translated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborContext {
    pub source: String,
    pub translated: String,
}

/// A request to translate one sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// Sentence text in the source language.
    pub text: String,
    /// Free-form guidance supplied by the submitter (terminology, tone).
    pub context_hint: String,
    /// Preceding translated sentences, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub neighbors: Vec<NeighborContext>,
    /// Target language tag, e.g. "zh-CN".
    pub target_language: String,
}
