//! Sentence splitting over a token slice.

use std::collections::BTreeSet;
use std::future::Future;

use crate::segment::{RawToken, SegmentError, TimedSegment};

use super::config::SplitterConfig;

/// Characters that may trail a terminal mark, as in `"Stop."` or `(yes!)`.
const CLOSERS: &[char] = &['"', '\'', '”', '’', ')', ']', '}', '»', '」', '』'];

/// Splits timestamped tokens into sentence-level segments.
#[derive(Debug, Clone, Default)]
pub struct SentenceSplitter {
    config: SplitterConfig,
}

impl SentenceSplitter {
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Lazily splits `tokens` on terminal punctuation.
    pub fn split<'a>(&'a self, tokens: &'a [RawToken]) -> Sentences<'a> {
        Sentences::new(self, tokens, Boundaries::Punctuation)
    }

    /// Lazily splits `tokens` after each token index in `boundaries`.
    pub fn split_at<'a>(
        &'a self,
        tokens: &'a [RawToken],
        boundaries: &'a BTreeSet<usize>,
    ) -> Sentences<'a> {
        Sentences::new(self, tokens, Boundaries::Explicit(boundaries))
    }

    /// Returns true if `text` ends a sentence under the punctuation policy.
    pub fn is_terminal(&self, text: &str) -> bool {
        let trimmed = text.trim_end().trim_end_matches(CLOSERS);
        trimmed
            .chars()
            .last()
            .is_some_and(|c| self.config.terminal_punctuation.contains(c))
    }

    /// Collects sentence boundaries by asking `ask` about one window of
    /// token texts at a time.
    ///
    /// `ask` returns window-local indices of tokens that end a sentence;
    /// out-of-range indices are ignored. Windows are queried in order.
    pub async fn assisted_boundaries<F, Fut, E>(
        &self,
        tokens: &[RawToken],
        mut ask: F,
    ) -> Result<BTreeSet<usize>, E>
    where
        F: FnMut(Vec<String>) -> Fut,
        Fut: Future<Output = Result<Vec<usize>, E>>,
    {
        let size = self.config.assist_window_tokens.max(1);
        let mut boundaries = BTreeSet::new();

        for (window_idx, window) in tokens.chunks(size).enumerate() {
            let offset = window_idx * size;
            let texts = window.iter().map(|t| t.text.trim().to_string()).collect();
            let local = ask(texts).await?;
            boundaries.extend(
                local
                    .into_iter()
                    .filter(|&i| i < window.len())
                    .map(|i| offset + i),
            );
        }

        Ok(boundaries)
    }

    fn exceeds_max_duration(&self, start: f64, end: f64) -> bool {
        self.config.max_token_duration_secs > 0.0
            && end - start > self.config.max_token_duration_secs
    }
}

enum Boundaries<'a> {
    Punctuation,
    Explicit(&'a BTreeSet<usize>),
}

/// Lazy sequence of sentences produced by [`SentenceSplitter`].
///
/// Token ranges that overlap the previous token are clamped forward, so the
/// emitted sentences are ordered and never overlap. A sentence left with no
/// duration at millisecond precision after clamping is merged into its
/// neighbor. A malformed token (inverted or non-finite range) yields one
/// `Err` and ends the sequence.
pub struct Sentences<'a> {
    splitter: &'a SentenceSplitter,
    tokens: &'a [RawToken],
    boundaries: Boundaries<'a>,
    pos: usize,
    prev_end: f64,
    pending: Option<TimedSegment>,
    held: Option<TimedSegment>,
    failed: Option<SegmentError>,
}

impl<'a> Sentences<'a> {
    fn new(
        splitter: &'a SentenceSplitter,
        tokens: &'a [RawToken],
        boundaries: Boundaries<'a>,
    ) -> Self {
        Self {
            splitter,
            tokens,
            boundaries,
            pos: 0,
            prev_end: f64::NEG_INFINITY,
            pending: None,
            held: None,
            failed: None,
        }
    }

    fn repair(&mut self, token: &RawToken) -> Result<(f64, f64), SegmentError> {
        if !token.is_well_formed() {
            return Err(SegmentError::invalid_range(token.start, token.end));
        }
        let start = token.start.max(self.prev_end);
        let end = token.end.max(start);
        self.prev_end = end;
        Ok((start, end))
    }

    fn is_boundary(&self, idx: usize, text: &str, buffered: usize) -> bool {
        let max = self.splitter.config.max_sentence_tokens;
        if max > 0 && buffered >= max {
            return true;
        }
        match self.boundaries {
            Boundaries::Punctuation => self.splitter.is_terminal(text),
            Boundaries::Explicit(set) => set.contains(&idx),
        }
    }

    fn fuse(&mut self) {
        self.pos = self.tokens.len();
        self.pending = None;
    }
}

impl Iterator for Sentences<'_> {
    type Item = Result<TimedSegment, SegmentError>;

    /// Holds back one sentence so that an empty-span sentence can be
    /// merged into the one before it, or into the next one when it
    /// comes first.
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.failed.take() {
            return Some(Err(e));
        }

        loop {
            match self.next_raw() {
                Some(Ok(segment)) => match self.held.take() {
                    Some(held) if is_empty_span(&held) || is_empty_span(&segment) => {
                        self.held = Some(held.merge(&segment));
                    }
                    Some(held) => {
                        self.held = Some(segment);
                        return Some(Ok(held));
                    }
                    None => self.held = Some(segment),
                },
                Some(Err(e)) => {
                    return match self.held.take() {
                        Some(held) => {
                            self.failed = Some(e);
                            Some(Ok(held))
                        }
                        None => Some(Err(e)),
                    };
                }
                None => return self.held.take().map(Ok),
            }
        }
    }
}

impl Sentences<'_> {
    fn next_raw(&mut self) -> Option<Result<TimedSegment, SegmentError>> {
        if let Some(segment) = self.pending.take() {
            return Some(Ok(segment));
        }

        let mut buffer = SentenceBuffer::default();

        while self.pos < self.tokens.len() {
            let idx = self.pos;
            let token = &self.tokens[idx];
            self.pos += 1;

            let (start, end) = match self.repair(token) {
                Ok(range) => range,
                Err(e) => {
                    self.fuse();
                    return Some(Err(e));
                }
            };

            if self.splitter.exceeds_max_duration(start, end) {
                let text = normalize_whitespace(&token.text);
                let standalone = match TimedSegment::new(start, end, text) {
                    Ok(segment) => segment,
                    Err(e) => {
                        self.fuse();
                        return Some(Err(e));
                    }
                };
                if buffer.is_empty() {
                    return Some(Ok(standalone));
                }
                self.pending = Some(standalone);
                return Some(buffer.finish());
            }

            buffer.push(start, end, &token.text);

            if self.is_boundary(idx, &token.text, buffer.len()) {
                return Some(buffer.finish());
            }
        }

        if buffer.is_empty() {
            None
        } else {
            Some(buffer.finish())
        }
    }
}

#[derive(Default)]
struct SentenceBuffer<'t> {
    start: Option<f64>,
    end: f64,
    texts: Vec<&'t str>,
}

impl<'t> SentenceBuffer<'t> {
    fn push(&mut self, start: f64, end: f64, text: &'t str) {
        if self.start.is_none() {
            self.start = Some(start);
        }
        self.end = end;
        self.texts.push(text);
    }

    fn len(&self) -> usize {
        self.texts.len()
    }

    fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    fn finish(self) -> Result<TimedSegment, SegmentError> {
        let start = self.start.unwrap_or(self.end);
        TimedSegment::new(start, self.end, normalize_whitespace(&self.texts.join(" ")))
    }
}

/// True if the segment would render with equal start and end timestamps.
fn is_empty_span(segment: &TimedSegment) -> bool {
    (segment.end() * 1000.0).round() <= (segment.start() * 1000.0).round()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
