//! Segment data types.

use serde::{Deserialize, Serialize};

use super::error::SegmentError;

/// A fine-grained timestamped token or phrase, as produced by transcription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToken {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Token text. May carry leading or trailing whitespace.
    pub text: String,
}

impl RawToken {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Returns true if both bounds are finite and `end >= start`.
    pub fn is_well_formed(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.end >= self.start
    }
}

/// A text unit covering `[start, end]` seconds.
///
/// The range is validated on construction and on deserialization, so a
/// `TimedSegment` value always satisfies `end >= start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SegmentRecord")]
pub struct TimedSegment {
    start: f64,
    end: f64,
    /// Text in the source language.
    pub source_text: String,
    /// Text in the target language, once translated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
}

impl TimedSegment {
    /// Creates a segment, rejecting `end < start` and non-finite bounds.
    pub fn new(start: f64, end: f64, source_text: impl Into<String>) -> Result<Self, SegmentError> {
        if !start.is_finite() || !end.is_finite() || end < start {
            return Err(SegmentError::invalid_range(start, end));
        }
        Ok(Self {
            start,
            end,
            source_text: source_text.into(),
            translated_text: None,
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Attaches a translation.
    pub fn with_translation(mut self, text: impl Into<String>) -> Self {
        self.translated_text = Some(text.into());
        self
    }

    /// Text to display: the translation when present, else the source.
    pub fn body(&self) -> &str {
        self.translated_text.as_deref().unwrap_or(&self.source_text)
    }

    /// Merges two segments into one spanning `[min(start), max(end)]`.
    ///
    /// Text is concatenated in time order with a single separating space.
    /// The translation is kept only if both sides have one.
    pub fn merge(&self, other: &TimedSegment) -> TimedSegment {
        let (first, second) = if other.start < self.start {
            (other, self)
        } else {
            (self, other)
        };

        let translated_text = match (&first.translated_text, &second.translated_text) {
            (Some(a), Some(b)) => Some(join_text(a, b)),
            _ => None,
        };

        TimedSegment {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            source_text: join_text(&first.source_text, &second.source_text),
            translated_text,
        }
    }
}

fn join_text(a: &str, b: &str) -> String {
    let a = a.trim();
    let b = b.trim();
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{} {}", a, b),
    }
}

#[derive(Deserialize)]
struct SegmentRecord {
    start: f64,
    end: f64,
    source_text: String,
    #[serde(default)]
    translated_text: Option<String>,
}

impl TryFrom<SegmentRecord> for TimedSegment {
    type Error = SegmentError;

    fn try_from(record: SegmentRecord) -> Result<Self, Self::Error> {
        let mut segment = TimedSegment::new(record.start, record.end, record.source_text)?;
        segment.translated_text = record.translated_text;
        Ok(segment)
    }
}
