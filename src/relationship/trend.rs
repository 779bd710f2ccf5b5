//! Trend detection over short sample series
//!
//! A trend compares the mean of the most recent three samples with the mean
//! of the three before them. Fewer than [`MIN_SAMPLES`] samples is always
//! stable.

use crate::types::{Polarity, Trend};

/// Samples needed before a series can show a direction
pub const MIN_SAMPLES: usize = 4;

const WINDOW: usize = 3;
const PERCENT_THRESHOLD: f64 = 0.10;
const SENTIMENT_THRESHOLD: f64 = 0.3;

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Recent and previous window means, when enough samples exist
pub fn window_means(samples: &[f64]) -> Option<(f64, f64)> {
    if samples.len() < MIN_SAMPLES {
        return None;
    }
    let split = samples.len() - WINDOW;
    let previous_start = split.saturating_sub(WINDOW);
    Some((mean(&samples[split..]), mean(&samples[previous_start..split])))
}

/// Relative change beyond ±10% of the previous mean
pub fn percent_trend(samples: &[f64]) -> Trend {
    let Some((recent, previous)) = window_means(samples) else {
        return Trend::Stable;
    };

    let denominator = if previous.abs() < f64::EPSILON {
        1.0
    } else {
        previous.abs()
    };
    let change = (recent - previous) / denominator;

    if change > PERCENT_THRESHOLD {
        Trend::Improving
    } else if change < -PERCENT_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Trend of a series where smaller values are better
pub fn inverse_percent_trend(samples: &[f64]) -> Trend {
    match percent_trend(samples) {
        Trend::Improving => Trend::Declining,
        Trend::Declining => Trend::Improving,
        Trend::Stable => Trend::Stable,
    }
}

/// Polarity trend on the {+1, 0, -1} scale with an absolute ±0.3 threshold
pub fn sentiment_trend(history: &[Polarity]) -> Trend {
    let signed: Vec<f64> = history.iter().map(Polarity::as_signed).collect();
    let Some((recent, previous)) = window_means(&signed) else {
        return Trend::Stable;
    };

    if recent > previous + SENTIMENT_THRESHOLD {
        Trend::Improving
    } else if recent < previous - SENTIMENT_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Majority of improving vs declining; a tie is stable
pub fn overall(trends: &[Trend]) -> Trend {
    let improving = trends.iter().filter(|t| **t == Trend::Improving).count();
    let declining = trends.iter().filter(|t| **t == Trend::Declining).count();
    match improving.cmp(&declining) {
        std::cmp::Ordering::Greater => Trend::Improving,
        std::cmp::Ordering::Less => Trend::Declining,
        std::cmp::Ordering::Equal => Trend::Stable,
    }
}

/// Append to a bounded series, dropping the oldest values
pub fn push_sample(samples: &mut Vec<f64>, value: f64, capacity: usize) {
    if !value.is_finite() {
        return;
    }
    samples.push(value);
    if samples.len() > capacity {
        let excess = samples.len() - capacity;
        samples.drain(..excess);
    }
}
