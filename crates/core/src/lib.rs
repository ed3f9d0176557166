pub mod collaborator;
pub mod config;
pub mod executor;
pub mod job;
pub mod metrics;
pub mod orchestrator;
pub mod registry;
pub mod render;
pub mod segment;
pub mod splitter;
pub mod storage;
pub mod testing;

pub use collaborator::{
    BoundaryOracle, CollaboratorError, Fetcher, OpenAiTranslator, Transcriber, Translator,
    WhisperCliTranscriber, YtDlpFetcher,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
    SanitizedConfig,
};
pub use job::{
    InMemoryJobStore, Job, JobId, JobRequest, JobStatus, JobStatusView, JobStore, SqliteJobStore,
    StageFailure,
};
pub use orchestrator::{Collaborators, JobOrchestrator};
pub use registry::{JobRegistry, RegistryError, RegistrySummary, SchedulerConfig};
pub use render::render_srt;
pub use segment::{RawToken, TimedSegment};
pub use splitter::SentenceSplitter;
pub use storage::{ArtifactKey, ArtifactStorage, FsArtifactStorage};
