//! SubRip (SRT) output.

use std::fmt::Write;
use thiserror::Error;

use crate::segment::TimedSegment;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("segment {index} has invalid range [{start}, {end}]")]
    InvalidRange { index: usize, start: f64, end: f64 },

    #[error("segment {index} at {start} overlaps the previous cue ending at {previous_end}")]
    Overlap {
        index: usize,
        start: f64,
        previous_end: f64,
    },
}

pub(super) fn to_millis(secs: f64) -> u64 {
    (secs * 1000.0).round().max(0.0) as u64
}

/// Formats seconds as `HH:MM:SS,mmm`.
pub fn format_timestamp(secs: f64) -> String {
    let ms = to_millis(secs);
    format!(
        "{:02}:{:02}:{:02},{:03}",
        ms / 3_600_000,
        (ms % 3_600_000) / 60_000,
        (ms % 60_000) / 1000,
        ms % 1000
    )
}

/// Renders segments as an SRT document.
///
/// Segments are ordered by start time (stable for ties) and numbered from 1.
/// The cue body is the translation, or the source text if none was set.
/// Any segment whose duration is not positive at millisecond precision, or
/// that overlaps its predecessor, fails the whole render. Output is a pure
/// function of the input.
pub fn render_srt(segments: &[TimedSegment]) -> Result<String, RenderError> {
    for (index, segment) in segments.iter().enumerate() {
        if to_millis(segment.end()) <= to_millis(segment.start()) {
            return Err(RenderError::InvalidRange {
                index,
                start: segment.start(),
                end: segment.end(),
            });
        }
    }

    let mut ordered: Vec<(usize, &TimedSegment)> = segments.iter().enumerate().collect();
    ordered.sort_by(|a, b| a.1.start().total_cmp(&b.1.start()));

    let mut out = String::new();
    let mut previous_end: Option<f64> = None;

    for (cue, (index, segment)) in ordered.into_iter().enumerate() {
        if let Some(previous_end) = previous_end {
            if to_millis(segment.start()) < to_millis(previous_end) {
                return Err(RenderError::Overlap {
                    index,
                    start: segment.start(),
                    previous_end,
                });
            }
        }
        previous_end = Some(segment.end());

        let body: Vec<&str> = segment
            .body()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            cue + 1,
            format_timestamp(segment.start()),
            format_timestamp(segment.end()),
            body.join("\n")
        );
    }

    Ok(out)
}
