//! Testing utilities and mock collaborators.
//!
//! Every collaborator trait has a mock here, so the full pipeline can run
//! without yt-dlp, whisper or a translation API.
//!
//! # Example
//!
//! ```rust,ignore
//! use subweaver_core::testing::{MockFetcher, MockTranscriber, MockTranslator};
//!
//! let transcriber = MockTranscriber::new();
//! transcriber.set_tokens(fixtures::sentence_tokens(4)).await;
//!
//! // Make the next two calls fail with a transient error
//! transcriber.script().fail_transiently(2);
//!
//! // Hold every fetch until released
//! fetcher.script().block();
//! ```

mod memory_storage;
mod mock_collaborators;
mod script;

pub use memory_storage::MemoryStorage;
pub use mock_collaborators::{MockBoundaryOracle, MockFetcher, MockTranscriber, MockTranslator};
pub use script::Script;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::job::JobRequest;
    use crate::segment::RawToken;

    /// The four-token, two-sentence transcript used throughout the tests.
    pub fn tokens() -> Vec<RawToken> {
        vec![
            RawToken::new(0.0, 0.5, "Hello"),
            RawToken::new(0.5, 1.2, "world."),
            RawToken::new(1.2, 1.3, "Next"),
            RawToken::new(1.3, 2.0, "sentence."),
        ]
    }

    /// `n` two-token sentences "Sentence {i}." back to back, one second each.
    pub fn sentence_tokens(n: usize) -> Vec<RawToken> {
        (0..n)
            .flat_map(|i| {
                let start = i as f64;
                [
                    RawToken::new(start, start + 0.5, "Sentence"),
                    RawToken::new(start + 0.5, start + 1.0, format!("{}.", i)),
                ]
            })
            .collect()
    }

    /// Sentence text produced by [`sentence_tokens`] for index `i`.
    pub fn sentence_text(i: usize) -> String {
        format!("Sentence {}.", i)
    }

    /// A valid job request.
    pub fn job_request(n: usize) -> JobRequest {
        JobRequest::new(format!("https://videos.example.com/watch?v={}", n))
            .with_context_hint("A conference talk about compilers")
    }
}
