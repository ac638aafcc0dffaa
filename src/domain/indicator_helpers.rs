//! Shared helper functions for indicator calculations.
//!
//! Helpers operate on plain `f64` slices and return `Option` per position,
//! `None` marking warm-up. [`simple_series`] turns such a vector into an
//! aligned [`IndicatorSeries`].

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn simple_series(
    indicator_type: IndicatorType,
    bars: &[OhlcvBar],
    values: &[Option<f64>],
) -> IndicatorSeries {
    let values = bars
        .iter()
        .zip(values)
        .map(|(bar, v)| IndicatorPoint {
            timestamp: bar.timestamp,
            valid: v.is_some(),
            value: IndicatorValue::Simple(v.unwrap_or(0.0)),
        })
        .collect();
    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// True range per bar; the first bar has no previous close and uses high − low.
pub fn true_ranges(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

/// Rolling arithmetic mean; the first `period - 1` positions are `None`.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = Some(sum / period as f64);
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out[i] = Some(sum / period as f64);
    }
    out
}

/// Rolling maximum over the trailing window ending at each index.
pub fn rolling_max(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_fold(values, period, f64::max)
}

/// Rolling minimum over the trailing window ending at each index.
pub fn rolling_min(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_fold(values, period, f64::min)
}

fn rolling_fold(values: &[f64], period: usize, f: fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        out[i] = window.iter().copied().reduce(f);
    }
    out
}

/// EMA over a partially defined input. The average is seeded with the SMA of
/// the first `period` defined values and each later value is folded in with
/// k = 2/(period+1). Positions before the seed are `None`.
pub fn ema_of(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut seen = 0usize;
    let mut sum = 0.0;
    let mut ema: Option<f64> = None;

    for (i, v) in values.iter().enumerate() {
        let Some(v) = *v else { continue };
        match ema {
            None => {
                seen += 1;
                sum += v;
                if seen == period {
                    let seed = sum / period as f64;
                    ema = Some(seed);
                    out[i] = Some(seed);
                }
            }
            Some(prev) => {
                let next = v * k + prev * (1.0 - k);
                ema = Some(next);
                out[i] = Some(next);
            }
        }
    }
    out
}

/// Wilder smoothing starting at `start`: the first output (index
/// `start + period - 1`) is the mean of `period` inputs, then
/// avg = (prev * (n-1) + x) / n.
pub fn wilder_smooth(values: &[f64], period: usize, start: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < start + period {
        return out;
    }
    let seed_end = start + period - 1;
    let mut avg = values[start..=seed_end].iter().sum::<f64>() / period as f64;
    out[seed_end] = Some(avg);
    for i in (seed_end + 1)..values.len() {
        avg = (avg * (period - 1) as f64 + values[i]) / period as f64;
        out[i] = Some(avg);
    }
    out
}

/// a / b, or `fallback` when b is zero.
pub fn safe_div(a: f64, b: f64, fallback: f64) -> f64 {
    if b == 0.0 { fallback } else { a / b }
}
