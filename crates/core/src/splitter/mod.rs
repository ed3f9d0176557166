//! Sentence splitter.
//!
//! Turns the flat token stream produced by transcription into sentence-level
//! [`TimedSegment`](crate::segment::TimedSegment)s. Two boundary policies are
//! supported:
//! - **Punctuation**: a token ending in a terminal punctuation mark closes
//!   the current sentence.
//! - **Assisted**: an external [`BoundaryOracle`](crate::collaborator::BoundaryOracle)
//!   is asked, one window of tokens at a time, which tokens end a sentence.
//!
//! Splitting keeps no state between invocations; the same tokens and the
//! same boundaries always produce the same sentences.

mod config;
mod sentences;

pub use config::{SplitMode, SplitterConfig};
pub use sentences::{SentenceSplitter, Sentences};
