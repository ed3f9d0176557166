//! External collaborators.
//!
//! The pipeline treats media download, speech recognition, translation and
//! sentence-boundary detection as opaque calls behind the traits in this
//! module. Each call reports failures as a [`CollaboratorError`], classified
//! as transient (worth retrying) or permanent.
//!
//! Real adapters:
//! - [`YtDlpFetcher`]: downloads and extracts audio with `yt-dlp`
//! - [`WhisperCliTranscriber`]: runs the whisper.cpp CLI with JSON output
//! - [`OpenAiTranslator`]: OpenAI-compatible chat completions, also usable
//!   as a [`BoundaryOracle`]

mod config;
mod error;
mod llm;
mod traits;
mod types;
mod whisper_cli;
mod ytdlp;

pub use config::{FetcherConfig, TranscriberConfig, TranslatorConfig};
pub use error::CollaboratorError;
pub use llm::OpenAiTranslator;
pub use traits::{BoundaryOracle, Fetcher, Transcriber, Translator};
pub use types::{FetchRequest, NeighborContext, TranslationRequest};
pub use whisper_cli::WhisperCliTranscriber;
pub use ytdlp::YtDlpFetcher;
