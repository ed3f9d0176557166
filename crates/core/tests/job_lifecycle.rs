//! Job lifecycle integration tests.
//!
//! These tests drive jobs through the registry with mock collaborators:
//! Queued -> Fetching -> Transcribing -> Translating -> Rendering -> Succeeded

mod common;

use std::time::Duration;

use chrono::Utc;

use common::{TestHarness, TIMEOUT};
use subweaver_core::{
    job::{ErrorKind, Job, JobId, JobStatus, JobStore},
    orchestrator::TranslationConfig,
    registry::{RegistryError, SchedulerConfig},
    segment::RawToken,
    splitter::{SplitMode, SplitterConfig},
    testing::fixtures,
    JobRequest,
};

const EXPECTED_SRT: &str = "1\n00:00:00,000 --> 00:00:01,200\n[zh-CN] Hello world.\n\n\
                            2\n00:00:01,200 --> 00:00:02,000\n[zh-CN] Next sentence.\n\n";

#[tokio::test]
async fn test_job_succeeds_end_to_end() {
    let harness = TestHarness::new();
    let registry = harness.registry();

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Succeeded, TIMEOUT).await);

    let artifact_ref = registry.get_result(&id).unwrap();
    assert_eq!(artifact_ref, format!("jobs/{}/rendering/subtitles.srt", id));

    let bytes = registry.artifact(&id).await.unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), EXPECTED_SRT);

    let view = registry.status(&id).unwrap();
    assert!(view.error_summary.is_none());
    assert_eq!(view.progress, 1.0);
    assert_eq!((view.segments_translated, view.segments_total), (2, 2));

    let keys = harness.storage.keys().await;
    for name in [
        "fetching/source.json",
        "transcribing/transcript.json",
        "translating/sentences.json",
        "rendering/subtitles.srt",
    ] {
        assert!(
            keys.contains(&format!("jobs/{}/{}", id, name)),
            "missing artifact {}",
            name
        );
    }

    assert!(harness.wait_for_stored(&id, JobStatus::Succeeded).await);
    let stored = harness.job_store.get(&id).unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Succeeded);
    assert_eq!(stored.result_artifact_ref.as_deref(), Some(artifact_ref.as_str()));
    assert_eq!(stored.progress, 1.0);
}

#[tokio::test]
async fn test_context_hint_reaches_translator() {
    let harness = TestHarness::new();
    let registry = harness.registry();

    let request = JobRequest::new("https://v/1").with_context_hint("Chemistry lecture");
    let id = registry.submit(request).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Succeeded, TIMEOUT).await);

    let requests = harness.translator.recorded_requests().await;
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.context_hint == "Chemistry lecture"));
    assert!(requests.iter().all(|r| r.target_language == "zh-CN"));
}

#[tokio::test]
async fn test_transcribe_permanent_failure_fails_job() {
    let harness = TestHarness::new();
    harness
        .transcriber
        .script()
        .fail_permanently("unsupported audio")
        .await;
    let registry = harness.registry();

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Failed, TIMEOUT).await);

    let job = registry.snapshot(&id).unwrap();
    let failure = job.stage_error.unwrap();
    assert_eq!(failure.stage, "Transcribing");
    assert_eq!(failure.collaborator, "mock-transcriber");
    assert_eq!(failure.kind, ErrorKind::Permanent);
    assert!(job.result_artifact_ref.is_none());

    // Permanent errors are not retried
    assert_eq!(harness.transcriber.script().calls(), 1);
    // Never reached translation or rendering
    assert_eq!(harness.translator.request_count().await, 0);
    let keys = harness.storage.keys().await;
    assert!(!keys.iter().any(|k| k.contains("/rendering/")));

    let view = registry.status(&id).unwrap();
    assert!(view.error_summary.unwrap().contains("Transcribing"));
    assert!(matches!(
        registry.get_result(&id),
        Err(RegistryError::NotReady {
            status: JobStatus::Failed,
            ..
        })
    ));
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let harness = TestHarness::new();
    harness.fetcher.script().fail_transiently(2);
    let registry = harness.registry();

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Succeeded, TIMEOUT).await);

    let requests = harness.fetcher.recorded_requests().await;
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.job_id == id.to_string()));
    // Manifest written once, by the successful attempt
    let manifest = format!("jobs/{}/fetching/source.json", id);
    assert_eq!(harness.storage.write_count(&manifest).await, 1);
}

#[tokio::test]
async fn test_exhausted_retries_fail_job() {
    let harness = TestHarness::new();
    harness.translator.script().fail_transiently(100);
    let registry = harness.registry();

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Failed, TIMEOUT).await);

    let failure = registry.snapshot(&id).unwrap().stage_error.unwrap();
    assert_eq!(failure.stage, "Translating");
    assert_eq!(failure.collaborator, "mock-translator");
    assert_eq!(failure.kind, ErrorKind::Permanent);
}

#[tokio::test]
async fn test_cancel_queued_job_never_fetches() {
    let harness = TestHarness::new();
    harness.fetcher.script().block();
    let registry = harness.registry_with(
        SchedulerConfig::default().with_max_concurrent_jobs(1),
        TestHarness::orchestrator_config(),
    );

    let first = registry.submit(fixtures::job_request(1)).await.unwrap();
    let second = registry.submit(fixtures::job_request(2)).await.unwrap();
    assert!(TestHarness::wait_until(|| harness.fetcher.script().calls() == 1, TIMEOUT).await);
    assert_eq!(registry.status(&second).unwrap().status, JobStatus::Queued);

    registry.cancel(&second).unwrap();
    assert_eq!(registry.status(&second).unwrap().status, JobStatus::Cancelled);
    assert!(registry.snapshot(&second).unwrap().cancel_requested);

    harness.fetcher.script().release();
    assert!(TestHarness::wait_for_status(&registry, &first, JobStatus::Succeeded, TIMEOUT).await);

    let fetched: Vec<String> = harness
        .fetcher
        .recorded_requests()
        .await
        .into_iter()
        .map(|r| r.job_id)
        .collect();
    assert_eq!(fetched, vec![first.to_string()]);
    assert_eq!(registry.status(&second).unwrap().status, JobStatus::Cancelled);
    assert!(harness.wait_for_stored(&second, JobStatus::Cancelled).await);
}

#[tokio::test]
async fn test_cancel_running_job_drops_in_flight_call() {
    let harness = TestHarness::new();
    harness.fetcher.script().block();
    let registry = harness.registry();

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_until(|| harness.fetcher.script().calls() == 1, TIMEOUT).await);
    assert_eq!(registry.status(&id).unwrap().status, JobStatus::Fetching);

    registry.cancel(&id).unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Cancelled, TIMEOUT).await);
    assert!(harness.transcriber.recorded_paths().await.is_empty());

    // Cancelling a finished job is a no-op
    registry.cancel(&id).unwrap();
    assert_eq!(registry.status(&id).unwrap().status, JobStatus::Cancelled);
}

#[tokio::test]
async fn test_unknown_job_lookups() {
    let harness = TestHarness::new();
    let registry = harness.registry();
    let unknown = JobId::new();

    assert!(matches!(registry.status(&unknown), Err(RegistryError::NotFound(_))));
    assert!(matches!(registry.cancel(&unknown), Err(RegistryError::NotFound(_))));
    assert!(matches!(registry.get_result(&unknown), Err(RegistryError::NotFound(_))));
    assert!(matches!(
        registry.artifact(&unknown).await,
        Err(RegistryError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_result_not_ready_while_running() {
    let harness = TestHarness::new();
    harness.transcriber.script().block();
    let registry = harness.registry();

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(
        TestHarness::wait_for_status(&registry, &id, JobStatus::Transcribing, TIMEOUT).await
    );
    assert!(matches!(
        registry.get_result(&id),
        Err(RegistryError::NotReady {
            status: JobStatus::Transcribing,
            ..
        })
    ));

    harness.transcriber.script().release();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Succeeded, TIMEOUT).await);
    assert!(registry.get_result(&id).is_ok());
}

#[tokio::test]
async fn test_invalid_input_creates_no_job() {
    let harness = TestHarness::new();
    let registry = harness.registry();

    for request in [
        JobRequest::new(""),
        JobRequest::new("https://v/1 https://v/2"),
        JobRequest::new("--exec=touch${IFS}/tmp/x"),
        JobRequest::new("https://v/1").with_context_hint("x".repeat(5000)),
    ] {
        assert!(matches!(
            registry.submit(request).await,
            Err(RegistryError::InvalidInput(_))
        ));
    }

    assert_eq!(registry.summary().queued, 0);
    assert!(harness.job_store.list(&Default::default()).unwrap().is_empty());
    assert_eq!(harness.fetcher.script().calls(), 0);
}

#[tokio::test]
async fn test_panicking_collaborator_fails_job_and_frees_slot() {
    let harness = TestHarness::new();
    harness.transcriber.script().panic_on_call();
    let registry = harness.registry_with(
        SchedulerConfig::default().with_max_concurrent_jobs(1),
        TestHarness::orchestrator_config(),
    );

    let first = registry.submit(fixtures::job_request(1)).await.unwrap();
    let second = registry.submit(fixtures::job_request(2)).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &first, JobStatus::Failed, TIMEOUT).await);
    assert!(TestHarness::wait_for_status(&registry, &second, JobStatus::Failed, TIMEOUT).await);

    let failure = registry.snapshot(&first).unwrap().stage_error.unwrap();
    assert_eq!(failure.stage, "Transcribing");
    assert_eq!(failure.collaborator, "orchestrator");
    assert!(harness.wait_for_stored(&first, JobStatus::Failed).await);
    assert!(TestHarness::wait_until(|| registry.summary().active == 0, TIMEOUT).await);
}

#[tokio::test]
async fn test_inverted_token_fails_before_rendering() {
    let harness = TestHarness::new();
    harness
        .transcriber
        .set_tokens(vec![
            RawToken::new(0.0, 1.0, "Fine."),
            RawToken::new(2.0, 1.0, "Broken."),
        ])
        .await;
    let registry = harness.registry();

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Failed, TIMEOUT).await);

    let failure = registry.snapshot(&id).unwrap().stage_error.unwrap();
    assert_eq!(failure.stage, "Translating");
    assert_eq!(failure.collaborator, "splitter");
    assert_eq!(failure.kind, ErrorKind::InvalidRange);
    assert!(!harness
        .storage
        .keys()
        .await
        .iter()
        .any(|k| k.contains("/rendering/")));
}

#[tokio::test]
async fn test_zero_duration_sentence_fails_rendering() {
    let harness = TestHarness::new();
    harness
        .transcriber
        .set_tokens(vec![RawToken::new(3.0, 3.0, "Blip.")])
        .await;
    let registry = harness.registry();

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Failed, TIMEOUT).await);

    let failure = registry.snapshot(&id).unwrap().stage_error.unwrap();
    assert_eq!(failure.stage, "Rendering");
    assert_eq!(failure.collaborator, "renderer");
    assert_eq!(failure.kind, ErrorKind::InvalidRange);
    assert!(harness
        .storage
        .get(&format!("jobs/{}/rendering/subtitles.srt", id))
        .await
        .is_none());
}

#[tokio::test]
async fn test_token_nested_in_previous_still_renders() {
    let harness = TestHarness::new();
    harness
        .transcriber
        .set_tokens(vec![
            RawToken::new(0.0, 1.0, "First."),
            RawToken::new(0.5, 0.9, "Yes."),
        ])
        .await;
    let registry = harness.registry();

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Succeeded, TIMEOUT).await);

    let srt = String::from_utf8(registry.artifact(&id).await.unwrap()).unwrap();
    assert_eq!(srt, "1\n00:00:00,000 --> 00:00:01,000\n[zh-CN] First. Yes.\n\n");
}

#[tokio::test]
async fn test_long_translation_becomes_several_cues() {
    let harness = TestHarness::new();
    harness
        .translator
        .set_translation(
            "Hello world.",
            "你好，世界。这是一段很长的翻译文本，需要拆分成多条字幕。",
        )
        .await;
    harness
        .translator
        .set_translation("Next sentence.", "下一句。")
        .await;
    let config = TestHarness::orchestrator_config()
        .with_translation(TranslationConfig::default().with_max_cue_chars(12));
    let registry = harness.registry_with(SchedulerConfig::default(), config);

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Succeeded, TIMEOUT).await);

    let srt = String::from_utf8(registry.artifact(&id).await.unwrap()).unwrap();
    assert_eq!(
        srt,
        "1\n00:00:00,000 --> 00:00:00,257\n你好，世界。\n\n\
         2\n00:00:00,257 --> 00:00:00,771\n这是一段很长的翻译文本，\n\n\
         3\n00:00:00,771 --> 00:00:01,200\n需要拆分成多条字幕。\n\n\
         4\n00:00:01,200 --> 00:00:02,000\n下一句。\n\n"
    );
}

#[tokio::test]
async fn test_rendering_is_idempotent_across_jobs() {
    let harness = TestHarness::new();
    let registry = harness.registry();

    let a = registry.submit(fixtures::job_request(1)).await.unwrap();
    let b = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &a, JobStatus::Succeeded, TIMEOUT).await);
    assert!(TestHarness::wait_for_status(&registry, &b, JobStatus::Succeeded, TIMEOUT).await);

    assert_ne!(a, b);
    assert_eq!(
        registry.artifact(&a).await.unwrap(),
        registry.artifact(&b).await.unwrap()
    );
}

#[tokio::test]
async fn test_translations_reassembled_in_order() {
    let harness = TestHarness::new();
    harness
        .transcriber
        .set_tokens(fixtures::sentence_tokens(4))
        .await;
    // Earlier sentences finish last
    for (i, delay) in [(0, 80), (1, 60), (2, 40), (3, 0)] {
        harness
            .translator
            .set_delay(fixtures::sentence_text(i), Duration::from_millis(delay))
            .await;
    }
    let config = TestHarness::orchestrator_config()
        .with_translation(TranslationConfig::default().with_fan_out(4));
    let registry = harness.registry_with(SchedulerConfig::default(), config);

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Succeeded, TIMEOUT).await);

    let srt = String::from_utf8(registry.artifact(&id).await.unwrap()).unwrap();
    let bodies: Vec<&str> = srt
        .split("\n\n")
        .filter(|cue| !cue.is_empty())
        .map(|cue| cue.lines().nth(2).unwrap())
        .collect();
    let expected: Vec<String> = (0..4)
        .map(|i| format!("[zh-CN] {}", fixtures::sentence_text(i)))
        .collect();
    assert_eq!(bodies, expected);
}

#[tokio::test]
async fn test_translation_progress_visible_while_running() {
    let harness = TestHarness::new();
    harness
        .transcriber
        .set_tokens(fixtures::sentence_tokens(4))
        .await;
    harness
        .translator
        .set_delay(fixtures::sentence_text(2), Duration::from_secs(30))
        .await;
    let config = TestHarness::orchestrator_config()
        .with_translation(TranslationConfig::default().with_fan_out(1));
    let registry = harness.registry_with(SchedulerConfig::default(), config);

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(
        TestHarness::wait_until(
            || matches!(registry.status(&id), Ok(v) if v.segments_translated == 2),
            TIMEOUT
        )
        .await
    );

    let view = registry.status(&id).unwrap();
    assert_eq!(view.status, JobStatus::Translating);
    assert_eq!(view.segments_total, 4);
    assert!((view.progress - 0.675).abs() < 1e-9);

    // Persisted once per batch
    let store = std::sync::Arc::clone(&harness.job_store);
    assert!(
        TestHarness::wait_until(
            || matches!(store.get(&id), Ok(Some(job)) if job.segments_translated == 2),
            TIMEOUT
        )
        .await
    );

    registry.cancel(&id).unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Cancelled, TIMEOUT).await);
    let view = registry.status(&id).unwrap();
    assert!((view.progress - 0.675).abs() < 1e-9);
}

#[tokio::test]
async fn test_neighbors_come_from_earlier_batches() {
    let harness = TestHarness::new();
    harness
        .transcriber
        .set_tokens(fixtures::sentence_tokens(5))
        .await;
    let config = TestHarness::orchestrator_config().with_translation(
        TranslationConfig::default()
            .with_fan_out(2)
            .with_neighbor_window(2),
    );
    let registry = harness.registry_with(SchedulerConfig::default(), config);

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Succeeded, TIMEOUT).await);

    let requests = harness.translator.recorded_requests().await;
    assert_eq!(requests.len(), 5);
    let neighbors_of = |i: usize| {
        let text = fixtures::sentence_text(i);
        let request = requests.iter().find(|r| r.text == text).unwrap();
        request
            .neighbors
            .iter()
            .map(|n| n.source.clone())
            .collect::<Vec<_>>()
    };

    assert!(neighbors_of(0).is_empty());
    assert!(neighbors_of(1).is_empty());
    let earlier = vec![fixtures::sentence_text(0), fixtures::sentence_text(1)];
    assert_eq!(neighbors_of(2), earlier);
    assert_eq!(neighbors_of(3), earlier);
    assert_eq!(
        neighbors_of(4),
        vec![fixtures::sentence_text(2), fixtures::sentence_text(3)]
    );
}

#[tokio::test]
async fn test_assisted_splitting_uses_oracle() {
    let harness = TestHarness::new();
    harness
        .transcriber
        .set_tokens(vec![
            RawToken::new(0.0, 0.5, "one;"),
            RawToken::new(0.5, 1.0, "two"),
            RawToken::new(1.0, 1.5, "three;"),
        ])
        .await;
    let config = TestHarness::orchestrator_config()
        .with_splitter(SplitterConfig::default().with_mode(SplitMode::Assisted));
    let registry = harness.registry_with(SchedulerConfig::default(), config);

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Succeeded, TIMEOUT).await);

    assert_eq!(harness.oracle.recorded_windows().await.len(), 1);
    let mut texts: Vec<String> = harness
        .translator
        .recorded_requests()
        .await
        .into_iter()
        .map(|r| r.text)
        .collect();
    texts.sort();
    assert_eq!(texts, vec!["one;".to_string(), "two three;".to_string()]);
}

#[tokio::test]
async fn test_evicted_job_still_queryable_from_store() {
    let harness = TestHarness::new();
    let registry = harness.registry_with(
        SchedulerConfig::default().with_retention_secs(0),
        TestHarness::orchestrator_config(),
    );

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Succeeded, TIMEOUT).await);
    assert!(harness.wait_for_stored(&id, JobStatus::Succeeded).await);
    assert_eq!(registry.summary().finished, 1);

    assert_eq!(registry.evict_expired(Utc::now()), 1);
    assert_eq!(registry.summary().finished, 0);

    let view = registry.status(&id).unwrap();
    assert_eq!(view.status, JobStatus::Succeeded);
    assert_eq!(
        String::from_utf8(registry.artifact(&id).await.unwrap()).unwrap(),
        EXPECTED_SRT
    );
}

#[tokio::test]
async fn test_unrepresentable_retention_never_expires() {
    for retention in [u64::MAX, i64::MAX as u64, i64::MAX as u64 / 1000] {
        let harness = TestHarness::new();
        let registry = harness.registry_with(
            SchedulerConfig::default().with_retention_secs(retention),
            TestHarness::orchestrator_config(),
        );

        let id = registry.submit(fixtures::job_request(1)).await.unwrap();
        assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Succeeded, TIMEOUT).await);

        assert_eq!(registry.evict_expired(Utc::now()), 0);
        assert_eq!(registry.summary().finished, 1);
    }
}

#[tokio::test]
async fn test_running_jobs_are_not_evicted() {
    let harness = TestHarness::new();
    harness.fetcher.script().block();
    let registry = harness.registry_with(
        SchedulerConfig::default().with_retention_secs(0),
        TestHarness::orchestrator_config(),
    );

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(TestHarness::wait_until(|| harness.fetcher.script().calls() == 1, TIMEOUT).await);
    assert_eq!(registry.evict_expired(Utc::now() + chrono::Duration::hours(1)), 0);

    harness.fetcher.script().release();
    assert!(TestHarness::wait_for_status(&registry, &id, JobStatus::Succeeded, TIMEOUT).await);
}

#[tokio::test]
async fn test_sweeper_evicts_in_background() {
    let harness = TestHarness::new();
    let registry = harness.registry_with(
        SchedulerConfig::default()
            .with_retention_secs(0)
            .with_sweep_interval_ms(20),
        TestHarness::orchestrator_config(),
    );
    registry.start().await;
    assert!(registry.is_running());

    let id = registry.submit(fixtures::job_request(1)).await.unwrap();
    assert!(harness.wait_for_stored(&id, JobStatus::Succeeded).await);
    assert!(
        TestHarness::wait_until(|| registry.summary().finished == 0, TIMEOUT).await,
        "finished job was not evicted"
    );
    assert_eq!(registry.status(&id).unwrap().status, JobStatus::Succeeded);

    registry.stop().await;
    assert!(!registry.is_running());
}

#[tokio::test]
async fn test_start_marks_interrupted_jobs_failed() {
    let harness = TestHarness::new();
    let mut orphan = Job::new(fixtures::job_request(1));
    orphan.advance(JobStatus::Fetching).unwrap();
    orphan.advance(JobStatus::Transcribing).unwrap();
    harness.job_store.save(&orphan).unwrap();

    let registry = harness.registry();
    registry.start().await;

    let job = registry.snapshot(&orphan.id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    let failure = job.stage_error.unwrap();
    assert_eq!(failure.stage, "Transcribing");
    assert_eq!(failure.collaborator, "registry");

    registry.stop().await;
}
