//! Splitting long sentences into display-sized cues.

use crate::segment::TimedSegment;

use super::srt::to_millis;

/// Punctuation a cue may end on. Whitespace is always a break.
const BREAK_AFTER: &[char] = &[
    ',', ';', ':', '!', '?', '.', '，', '、', '；', '：', '！', '？', '。', '…',
];

/// Splits every segment whose body is longer than `max_chars` characters
/// into consecutive cues covering the same range.
///
/// Each cue's share of the range is proportional to its character count and
/// is at least one millisecond. A segment too short to give every piece a
/// millisecond stays whole. `max_chars == 0` disables splitting.
pub fn split_long_cues(segments: Vec<TimedSegment>, max_chars: usize) -> Vec<TimedSegment> {
    if max_chars == 0 {
        return segments;
    }
    segments
        .into_iter()
        .flat_map(|segment| split_segment(segment, max_chars))
        .collect()
}

fn split_segment(segment: TimedSegment, max_chars: usize) -> Vec<TimedSegment> {
    let pieces = split_text(segment.body(), max_chars);
    if pieces.len() < 2 {
        return vec![segment];
    }
    interpolate(&segment, &pieces).unwrap_or_else(|| vec![segment])
}

/// Breaks `text` into pieces of at most `max_chars` characters.
///
/// A piece ends after the last whitespace or punctuation that fits. Text
/// with no such break (CJK without punctuation, very long words) is cut at
/// exactly `max_chars` characters.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text.trim();

    if max_chars > 0 {
        while rest.chars().count() > max_chars {
            let (piece, tail) = rest.split_at(break_point(rest, max_chars));
            let piece = piece.trim_end();
            if !piece.is_empty() {
                pieces.push(piece.to_string());
            }
            rest = tail.trim_start();
        }
    }

    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}

/// Byte offset to cut at. Only called when `text` has more than
/// `max_chars` characters, so the hard cut always lands inside it.
fn break_point(text: &str, max_chars: usize) -> usize {
    let mut soft = None;
    for (count, (offset, ch)) in text.char_indices().enumerate() {
        if count == max_chars {
            return soft.unwrap_or(offset);
        }
        if ch.is_whitespace() && count > 0 {
            soft = Some(offset);
        } else if BREAK_AFTER.contains(&ch) {
            soft = Some(offset + ch.len_utf8());
        }
    }
    soft.unwrap_or(text.len())
}

fn interpolate(segment: &TimedSegment, pieces: &[String]) -> Option<Vec<TimedSegment>> {
    let start = to_millis(segment.start());
    let end = to_millis(segment.end());
    let count = pieces.len() as u64;
    if end.saturating_sub(start) < count {
        return None;
    }

    let weights: Vec<u64> = pieces
        .iter()
        .map(|p| p.chars().count().max(1) as u64)
        .collect();
    let total: u64 = weights.iter().sum();
    let span = end - start;

    let mut cues = Vec::with_capacity(pieces.len());
    let mut cursor = start;
    let mut seen: u64 = 0;

    for (i, (piece, weight)) in pieces.iter().zip(&weights).enumerate() {
        seen += weight;
        let still_to_place = count - 1 - i as u64;
        let boundary = (start + span * seen / total).clamp(cursor + 1, end - still_to_place);

        let (from, to) = (cursor as f64 / 1000.0, boundary as f64 / 1000.0);
        let cue = match segment.translated_text {
            Some(_) => TimedSegment::new(from, to, segment.source_text.clone())
                .ok()?
                .with_translation(piece.clone()),
            None => TimedSegment::new(from, to, piece.clone()).ok()?,
        };
        cues.push(cue);
        cursor = boundary;
    }

    Some(cues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_srt;

    fn translated(start: f64, end: f64, text: &str) -> TimedSegment {
        TimedSegment::new(start, end, "source sentence")
            .unwrap()
            .with_translation(text)
    }

    #[test]
    fn test_short_text_is_one_piece() {
        assert_eq!(split_text("  Hello world.  ", 20), vec!["Hello world."]);
        assert!(split_text("   ", 20).is_empty());
    }

    #[test]
    fn test_split_prefers_punctuation_and_spaces() {
        let pieces = split_text("We went to the market, then home to rest.", 24);
        assert_eq!(pieces, vec!["We went to the market,", "then home to rest."]);
        assert!(pieces.iter().all(|p| p.chars().count() <= 24));
    }

    #[test]
    fn test_cjk_splits_after_full_width_punctuation() {
        let pieces = split_text("今天我们去了市场，然后回家休息了一下午。", 12);
        assert_eq!(
            pieces,
            vec!["今天我们去了市场，", "然后回家休息了一下午。"]
        );
    }

    #[test]
    fn test_unbroken_text_is_cut_by_count() {
        let pieces = split_text("一二三四五六七八九十", 4);
        assert_eq!(pieces, vec!["一二三四", "五六七八", "九十"]);
    }

    #[test]
    fn test_times_follow_character_share() {
        let segment = translated(10.0, 13.0, "一二三四五六，七八九。");
        let cues = split_long_cues(vec![segment], 7);

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].translated_text.as_deref(), Some("一二三四五六，"));
        assert_eq!(cues[1].translated_text.as_deref(), Some("七八九。"));
        assert_eq!(cues[0].start(), 10.0);
        assert!((cues[0].end() - (10.0 + 3.0 * 7.0 / 11.0)).abs() < 0.001);
        assert_eq!(cues[0].end(), cues[1].start());
        assert_eq!(cues[1].end(), 13.0);
        assert!(cues.iter().all(|c| c.source_text == "source sentence"));
    }

    #[test]
    fn test_untranslated_pieces_become_source_text() {
        let segment = TimedSegment::new(0.0, 2.0, "alpha beta gamma delta").unwrap();
        let cues = split_long_cues(vec![segment], 11);
        let texts: Vec<&str> = cues.iter().map(|c| c.source_text.as_str()).collect();
        assert_eq!(texts, vec!["alpha beta", "gamma delta"]);
        assert!(cues.iter().all(|c| c.translated_text.is_none()));
    }

    #[test]
    fn test_too_short_range_stays_whole() {
        let segment = translated(1.0, 1.002, "一二三四五六七八九十");
        let cues = split_long_cues(vec![segment.clone()], 3);
        assert_eq!(cues, vec![segment]);
    }

    #[test]
    fn test_zero_disables_splitting() {
        let segment = translated(0.0, 5.0, "一二三四五六七八九十");
        assert_eq!(split_long_cues(vec![segment.clone()], 0), vec![segment]);
    }

    #[test]
    fn test_split_cues_render_in_order() {
        let segments = vec![
            translated(0.0, 1.0, "短句。"),
            translated(1.0, 1.9, "一二三四五六七八九十一二三四五六七八九十"),
            translated(2.5, 3.0, "结束。"),
        ];
        let cues = split_long_cues(segments, 6);
        assert_eq!(cues.len(), 6);
        for pair in cues.windows(2) {
            assert!(pair[0].end() <= pair[1].start());
        }

        let srt = render_srt(&cues).unwrap();
        assert!(srt.contains("00:00:01,000 --> 00:00:01,270\n一二三四五六\n"));
        assert!(srt.contains("00:00:01,810 --> 00:00:01,900\n九十\n"));
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,000\n短句。\n"));
    }
}
