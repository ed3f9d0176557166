//! Timed text units.
//!
//! A [`TimedSegment`] is the unit that flows from the splitter through
//! translation into rendering. [`RawToken`] is the looser shape emitted by
//! transcription, whose ranges may overlap until the splitter repairs them.

mod error;
mod types;

pub use error::SegmentError;
pub use types::{RawToken, TimedSegment};
