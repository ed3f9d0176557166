mod args;
mod metrics;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subweaver_core::{
    load_config, load_config_from_env, validate_config, ArtifactStorage, BoundaryOracle,
    Collaborators, Config, ConfigError, Fetcher, FsArtifactStorage, JobId, JobOrchestrator,
    JobRegistry, JobRequest, JobStatus, JobStore, OpenAiTranslator, SanitizedConfig,
    SqliteJobStore, Transcriber, Translator, WhisperCliTranscriber, YtDlpFetcher,
};

use args::Args;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How often job status is polled while waiting for completion
const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    }
}

/// Runs every requested job to completion. Returns false if any job did
/// not succeed.
async fn run() -> Result<bool> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    // Determine config path
    let config_path = std::env::var("SUBWEAVER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(ConfigError::FileNotFound(path)) => {
            warn!("Config file {} not found, using defaults", path);
            load_config_from_env().context("Failed to load config from environment")?
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to load config from {:?}", config_path))
        }
    };
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    let config_json = serde_json::to_string(&sanitized).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        max_concurrent_jobs = config.scheduler.max_concurrent_jobs,
        target_language = %config.translation.target_language,
        "Configuration loaded"
    );
    if !sanitized.translator.api_key_configured {
        warn!("No translator API key configured; requests will be sent unauthenticated");
    }

    let registry = build_registry(&config)?;
    registry.start().await;
    info!("Job registry started");

    let mut ids = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let request = JobRequest::new(input.clone()).with_context_hint(args.context.clone());
        let id = registry
            .submit(request)
            .await
            .with_context(|| format!("Failed to submit {}", input))?;
        info!(job_id = %id, input = %input, "Job submitted");
        ids.push(id);
    }

    let all_succeeded = tokio::select! {
        result = wait_for_jobs(&registry, &ids) => result?,
        _ = signal::ctrl_c() => {
            warn!("Interrupted, cancelling jobs");
            for id in &ids {
                if let Err(e) = registry.cancel(id) {
                    warn!(job_id = %id, error = %e, "Failed to cancel job");
                }
            }
            wait_for_jobs(&registry, &ids).await?;
            false
        }
    };

    report(&registry, &config, &ids);
    debug!("Metrics:\n{}", metrics::encode_metrics());

    registry.stop().await;
    Ok(all_succeeded)
}

fn build_registry(config: &Config) -> Result<JobRegistry> {
    let job_store: Arc<dyn JobStore> = Arc::new(
        SqliteJobStore::new(&config.database.path).context("Failed to create job store")?,
    );
    info!("Job store initialized at {:?}", config.database.path);

    let storage: Arc<dyn ArtifactStorage> =
        Arc::new(FsArtifactStorage::new(config.storage.root.clone()));
    info!("Artifact storage rooted at {:?}", config.storage.root);

    let fetcher: Arc<dyn Fetcher> = Arc::new(YtDlpFetcher::new(config.fetcher.clone()));
    let transcriber: Arc<dyn Transcriber> =
        Arc::new(WhisperCliTranscriber::new(config.transcriber.clone()));
    let translator = Arc::new(OpenAiTranslator::new(config.translator.clone()));
    info!(
        "Using {} for fetching, {} for transcription, model {} for translation",
        fetcher.name(),
        transcriber.name(),
        translator.model()
    );

    let collaborators = Collaborators {
        fetcher,
        transcriber,
        translator: Arc::clone(&translator) as Arc<dyn Translator>,
        boundary_oracle: Some(translator as Arc<dyn BoundaryOracle>),
        storage: Arc::clone(&storage),
        job_store: Arc::clone(&job_store),
    };
    let orchestrator = Arc::new(JobOrchestrator::new(config.orchestrator(), collaborators));

    Ok(JobRegistry::new(
        config.scheduler.clone(),
        orchestrator,
        job_store,
        storage,
    ))
}

/// Polls until every job is terminal. Returns true if all succeeded.
async fn wait_for_jobs(registry: &JobRegistry, ids: &[JobId]) -> Result<bool> {
    let mut last_seen = vec![JobStatus::Queued; ids.len()];

    loop {
        let mut done = true;
        for (id, last) in ids.iter().zip(last_seen.iter_mut()) {
            let view = registry.status(id).context("Failed to query job status")?;
            let status = view.status;
            if status != *last {
                info!(
                    job_id = %id,
                    status = %status,
                    progress = %format!("{:.0}%", view.progress * 100.0),
                    "Job status changed"
                );
                *last = status;
            }
            done &= status.is_terminal();
        }

        if done {
            return Ok(last_seen.iter().all(|s| *s == JobStatus::Succeeded));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Prints one line per job: the subtitle path on success, the failure otherwise.
fn report(registry: &JobRegistry, config: &Config, ids: &[JobId]) {
    for id in ids {
        match registry.snapshot(id) {
            Ok(job) => match (job.status, job.result_artifact_ref) {
                (JobStatus::Succeeded, Some(artifact)) => {
                    println!("{}\t{}", job.input_ref, config.storage.root.join(artifact).display());
                }
                (status, _) => {
                    let reason = job
                        .stage_error
                        .map(|f| f.summary())
                        .unwrap_or_else(|| status.to_string());
                    println!("{}\t{}", job.input_ref, reason);
                }
            },
            Err(e) => error!(job_id = %id, error = %e, "Failed to read job"),
        }
    }
}
