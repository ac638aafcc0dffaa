//! Stochastic oscillator (slow %K / %D).
//!
//! raw %K = 100 * (C - LL(n)) / (HH(n) - LL(n)), 50 when the range is flat.
//! %K = SMA(smooth) of raw %K, %D = SMA(d) of %K.
//! Warmup: n - 1 + smooth - 1 + d - 1 bars (17 for 14/3/3).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::{rolling_max, rolling_min, safe_div};
use crate::domain::ohlcv::OhlcvBar;

fn sma_of(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let sum: Option<f64> = window.iter().copied().sum();
            sum.map(|s| s / period as f64)
        })
        .collect()
}

pub fn calculate_stochastic(
    bars: &[OhlcvBar],
    k_period: usize,
    k_smooth: usize,
    d_period: usize,
) -> IndicatorSeries {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let hh = rolling_max(&highs, k_period);
    let ll = rolling_min(&lows, k_period);

    let raw_k: Vec<Option<f64>> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (hh[i], ll[i]) {
            (Some(h), Some(l)) => Some(safe_div(bar.close - l, h - l, 0.5) * 100.0),
            _ => None,
        })
        .collect();
    let k = sma_of(&raw_k, k_smooth);
    let d = sma_of(&k, d_period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorPoint {
            timestamp: bar.timestamp,
            valid: k[i].is_some() && d[i].is_some(),
            value: IndicatorValue::Stochastic {
                k: k[i].unwrap_or(0.0),
                d: d[i].unwrap_or(0.0),
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Stochastic {
            k_period,
            k_smooth,
            d_period,
        },
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::testing::bars_from_closes;
    use approx::assert_relative_eq;

    #[test]
    fn stochastic_warmup_is_17() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let series = calculate_stochastic(&bars_from_closes(&closes), 14, 3, 3);
        assert!(!series.values[16].valid);
        assert!(series.values[17].valid);
    }

    #[test]
    fn stochastic_top_of_range_is_100() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let series = calculate_stochastic(&bars_from_closes(&closes), 14, 3, 3);
        if let Some(IndicatorValue::Stochastic { k, d }) = series.latest() {
            assert_relative_eq!(*k, 100.0);
            assert_relative_eq!(*d, 100.0);
        } else {
            panic!("expected stochastic");
        }
    }

    #[test]
    fn stochastic_flat_range_is_50() {
        let series = calculate_stochastic(&bars_from_closes(&[42.0; 25]), 14, 3, 3);
        if let Some(IndicatorValue::Stochastic { k, d }) = series.latest() {
            assert_relative_eq!(*k, 50.0);
            assert_relative_eq!(*d, 50.0);
        } else {
            panic!("expected stochastic");
        }
    }
}
