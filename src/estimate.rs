use std::collections::HashMap;

const SAMPLE_ROUNDING_MS: u64 = 1_000;
const SKIP_THRESHOLD_MS: u64 = 10_000;
const MIN_PLAUSIBLE_LENGTH_MS: u64 = 30_000;
pub const DEFAULT_LENGTH_MS: u64 = 60_000;

pub fn estimate_length<I>(samples: I, confirmed: Option<u64>) -> u64
where
    I: IntoIterator<Item = u64>,
{
    let estimate = confirmed
        .filter(|ms| *ms > 0)
        .unwrap_or_else(|| inferred_length(samples));
    if estimate < MIN_PLAUSIBLE_LENGTH_MS {
        DEFAULT_LENGTH_MS
    } else {
        estimate
    }
}

pub fn completed_plays(total_played: u64, length_ms: u64) -> u64 {
    total_played.checked_div(length_ms).unwrap_or(0)
}

fn inferred_length<I>(samples: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    let rounded: Vec<u64> = samples.into_iter().map(round_to_second).collect();
    let Some(longest) = rounded.iter().copied().max() else {
        return 0;
    };

    let mut kept: Vec<u64> = rounded
        .into_iter()
        .filter(|ms| *ms >= SKIP_THRESHOLD_MS)
        .collect();
    if kept.is_empty() {
        kept.push(longest);
    }

    match mode(&kept) {
        Some((value, frequency)) if frequency > 1 => value,
        _ => kept.iter().copied().max().unwrap_or(longest),
    }
}

fn round_to_second(ms: u64) -> u64 {
    ms.saturating_add(SAMPLE_ROUNDING_MS / 2) / SAMPLE_ROUNDING_MS * SAMPLE_ROUNDING_MS
}

/// Most frequent value and its frequency. Ties go to the value seen first.
fn mode(values: &[u64]) -> Option<(u64, usize)> {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    let mut first_seen = Vec::new();
    for value in values {
        let count = counts.entry(*value).or_insert(0);
        if *count == 0 {
            first_seen.push(*value);
        }
        *count += 1;
    }

    let mut best: Option<(u64, usize)> = None;
    for value in first_seen {
        let frequency = counts[&value];
        if best.is_none_or(|(_, top)| frequency > top) {
            best = Some((value, frequency));
        }
    }
    best
}
