//! Standard Deviation indicator.
//!
//! Population standard deviation over n closing prices.
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n-1) / n)
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::simple_series;
use crate::domain::ohlcv::OhlcvBar;

/// Population (mean, stddev) of a window.
pub fn mean_and_stddev(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}

pub fn calculate_stddev(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values: Vec<Option<f64>> = (0..closes.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                None
            } else {
                Some(mean_and_stddev(&closes[i + 1 - period..=i]).1)
            }
        })
        .collect();
    simple_series(IndicatorType::Stddev(period), bars, &values)
}
