//! Job orchestrator.
//!
//! The orchestrator drives one job through the state machine:
//! - **Fetching**: download the source and extract audio
//! - **Transcribing**: speech to timestamped source-language tokens
//! - **Translating**: split into sentences, then translate with bounded fan-out
//! - **Rendering**: produce the SRT artifact and store it
//!
//! A cancel request is checked atomically with every stage transition, so no
//! new stage starts once it is observed.

mod config;
mod runner;
mod types;

pub use config::{OrchestratorConfig, TranslationConfig};
pub use runner::{JobOrchestrator, SUBTITLE_ARTIFACT};
pub use types::{Collaborators, OrchestratorError};
