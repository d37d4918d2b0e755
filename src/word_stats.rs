use crate::keystroke::{project, CharOutcome, Keystroke};
use crate::metrics;

/// Floor applied to per-word durations so near-simultaneous keystrokes
/// cannot produce absurd WPM spikes.
pub const MIN_WORD_DURATION_MS: u64 = 200;

/// Relative speed of one word against the session anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SpeedBucket {
    Crawl,
    Slow,
    Steady,
    Fast,
    Blazing,
}

impl SpeedBucket {
    /// Bucket boundaries sit at 75%, 90%, 110%, and 125% of the anchor.
    pub fn classify(word_wpm: f64, anchor: f64) -> Self {
        if anchor <= 0.0 {
            return SpeedBucket::Steady;
        }
        match word_wpm {
            w if w < anchor * 0.75 => SpeedBucket::Crawl,
            w if w < anchor * 0.90 => SpeedBucket::Slow,
            w if w < anchor * 1.10 => SpeedBucket::Steady,
            w if w < anchor * 1.25 => SpeedBucket::Fast,
            _ => SpeedBucket::Blazing,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            SpeedBucket::Crawl => 0,
            SpeedBucket::Slow => 1,
            SpeedBucket::Steady => 2,
            SpeedBucket::Fast => 3,
            SpeedBucket::Blazing => 4,
        }
    }
}

/// Post-session analysis of one word, for the input-history heatmap.
#[derive(Clone, Debug)]
pub struct WordStat {
    pub text: String,
    /// Character range of the word; `end` is the trailing space or text end.
    pub start: usize,
    pub end: usize,
    pub wpm: f64,
    pub bucket: SpeedBucket,
    /// True when any attempt at this word was wrong, even if later corrected.
    pub has_error: bool,
    /// Positions (relative to `start`) still wrong in the final projection.
    pub wrong_indices: Vec<usize>,
    /// Extra characters typed at the trailing space.
    pub extras: Vec<char>,
    /// When the word was reached by skipping, the cursor position the jump
    /// came from.
    pub skipped_from: Option<usize>,
}

/// Word ranges of the source text, split on spaces. `end` is exclusive.
pub fn word_ranges(chars: &[char]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = None;
    for (i, &c) in chars.iter().enumerate() {
        match (c == ' ', start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                ranges.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        ranges.push((s, chars.len()));
    }
    ranges
}

/// Per-word speed and error analysis over a finished (or in-flight) log.
///
/// Buckets anchor on the session WPM; a zero session WPM falls back to the
/// median of the per-word speeds so degenerate sessions still get a spread.
pub fn analyze(chars: &[char], log: &[Keystroke], session_wpm: f64) -> Vec<WordStat> {
    let states = project(chars, log);
    let ranges = word_ranges(chars);

    let mut stats = Vec::with_capacity(ranges.len());
    let mut previous_end_ts = 0u64;

    for (start, end) in ranges {
        let strokes: Vec<&Keystroke> = log
            .iter()
            .filter(|k| k.char_index >= start && k.char_index < end)
            .collect();

        let attempts = strokes.iter().filter(|k| !k.typed.is_backspace()).count();
        let last_ts = strokes
            .iter()
            .map(|k| k.timestamp_ms)
            .max()
            .unwrap_or(previous_end_ts);
        let duration = last_ts.saturating_sub(previous_end_ts).max(MIN_WORD_DURATION_MS);
        let wpm = (attempts as f64 / 5.0) / (duration as f64 / 60_000.0);
        if !strokes.is_empty() {
            previous_end_ts = last_ts;
        }

        let wrong_indices: Vec<usize> = (start..end)
            .filter(|&i| states[i].outcome == CharOutcome::Incorrect)
            .map(|i| i - start)
            .collect();
        let has_error = !wrong_indices.is_empty()
            || strokes
                .iter()
                .any(|k| !k.typed.is_backspace() && !k.is_correct);

        let extras = states.get(end).map(|s| s.extras.clone()).unwrap_or_default();
        // a skip into this word lands on the space right before it
        let skipped_from = start.checked_sub(1).and_then(|space| {
            log.iter()
                .rev()
                .find(|k| k.char_index == space && k.skip_origin.is_some())
                .and_then(|k| k.skip_origin)
        });

        stats.push(WordStat {
            text: chars[start..end].iter().collect(),
            start,
            end,
            wpm,
            bucket: SpeedBucket::Steady, // assigned once the anchor is known
            has_error,
            wrong_indices,
            extras,
            skipped_from,
        });
    }

    let anchor = if session_wpm > 0.0 {
        session_wpm
    } else {
        let speeds: Vec<f64> = stats.iter().map(|w| w.wpm).collect();
        metrics::median(&speeds).unwrap_or(0.0)
    };
    for stat in &mut stats {
        stat.bucket = SpeedBucket::classify(stat.wpm, anchor);
    }

    stats
}
