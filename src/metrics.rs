use std::collections::HashMap;

use itertools::Itertools;

use crate::keystroke::Keystroke;

pub fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        n => Some(data.iter().sum::<f64>() / n as f64),
    }
}

/// Population standard deviation.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let variance = data.iter().map(|v| (m - v) * (m - v)).sum::<f64>() / data.len() as f64;
    Some(variance.sqrt())
}

pub fn median(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let sorted: Vec<f64> = data
        .iter()
        .copied()
        .sorted_by(|a, b| a.partial_cmp(b).unwrap())
        .collect();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Keystrokes that matched their expected char. Backspaces are never correct.
pub fn correct_count(log: &[Keystroke]) -> usize {
    log.iter().filter(|k| k.is_correct).count()
}

/// Non-backspace keystrokes, i.e. every attempt at producing a character.
pub fn attempted_count(log: &[Keystroke]) -> usize {
    log.iter().filter(|k| !k.typed.is_backspace()).count()
}

/// Standardized words per minute: correct chars / 5 per minute.
/// Zero or negative elapsed time never produces a negative or NaN result.
pub fn wpm(correct: usize, elapsed_ms: i64) -> u32 {
    if elapsed_ms <= 0 {
        return 0;
    }
    let minutes = elapsed_ms as f64 / 60_000.0;
    ((correct as f64 / 5.0) / minutes).round() as u32
}

/// Raw speed over every logged keystroke, backspaces included.
///
/// Note the per-second chart series deliberately differs: `raw_series`
/// counts non-backspace keystrokes only. Both shapes are kept on purpose.
pub fn raw_wpm(total: usize, elapsed_ms: i64) -> u32 {
    if elapsed_ms <= 0 {
        return 0;
    }
    let minutes = elapsed_ms as f64 / 60_000.0;
    ((total as f64 / 5.0) / minutes).round() as u32
}

/// Share of attempts that were correct. No attempts means no penalty.
pub fn accuracy(correct: usize, attempted: usize) -> u32 {
    if attempted == 0 {
        return 100;
    }
    ((correct as f64 / attempted as f64) * 100.0).round() as u32
}

/// Cadence evenness on a 0-100 scale.
///
/// Buckets correct keystrokes into whole-second slots, converts each slot to
/// an instantaneous WPM (count * 12), and scores 100 minus the coefficient
/// of variation. The trailing partial second is excluded from bucketing so a
/// perfectly steady stream is not penalized for an incomplete slot.
pub fn consistency(log: &[Keystroke], elapsed_ms: u64) -> u32 {
    if elapsed_ms == 0 || log.is_empty() {
        return 0;
    }

    let complete_secs = (elapsed_ms / 1000) as usize;
    let mut counts = vec![0f64; complete_secs.max(1)];
    for ks in log.iter().filter(|k| k.is_correct) {
        let sec = (ks.timestamp_ms / 1000) as usize;
        if complete_secs == 0 {
            // sub-second session: everything lands in the single slot
            counts[0] += 1.0;
        } else if sec < complete_secs {
            counts[sec] += 1.0;
        }
    }

    let wpms: Vec<f64> = counts.iter().map(|c| c * 12.0).collect();
    let Some(m) = mean(&wpms) else { return 0 };
    if m == 0.0 {
        return 0;
    }
    let sd = std_dev(&wpms).unwrap_or(0.0);
    let cv = sd / m;
    (100.0 - cv * 100.0).max(0.0).round() as u32
}

fn series<F>(log: &[Keystroke], keep: F) -> Vec<(f64, f64)>
where
    F: Fn(&Keystroke) -> bool,
{
    let per_sec = log
        .iter()
        .filter(|k| keep(k))
        .fold(HashMap::new(), |mut map, k| {
            *map.entry(k.timestamp_ms / 1000 + 1).or_insert(0.0) += 1.0;
            map
        });

    let mut cumulative = 0.0;
    per_sec
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|(sec, count)| {
            cumulative += count;
            let s = sec as f64;
            (s, (cumulative / 5.0) * (60.0 / s))
        })
        .collect()
}

/// Cumulative WPM sampled at each active second, for the results chart.
pub fn wpm_series(log: &[Keystroke]) -> Vec<(f64, f64)> {
    series(log, |k| k.is_correct)
}

/// Raw variant of the chart series. Counts every attempt but, unlike
/// `raw_wpm`, leaves backspaces out of the per-second totals.
pub fn raw_series(log: &[Keystroke]) -> Vec<(f64, f64)> {
    series(log, |k| !k.typed.is_backspace())
}
