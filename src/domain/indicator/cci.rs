//! CCI (Commodity Channel Index).
//!
//! CCI = (TP - SMA(TP, n)) / (0.015 * mean deviation), 0 when the mean
//! deviation is zero. Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{safe_div, simple_series};
use crate::domain::ohlcv::OhlcvBar;

const CCI_CONSTANT: f64 = 0.015;

pub fn calculate_cci(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let tp: Vec<f64> = bars.iter().map(OhlcvBar::typical_price).collect();
    let values: Vec<Option<f64>> = (0..tp.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                return None;
            }
            let window = &tp[i + 1 - period..=i];
            let mean = window.iter().sum::<f64>() / period as f64;
            let mean_dev = window.iter().map(|v| (v - mean).abs()).sum::<f64>() / period as f64;
            Some(safe_div(tp[i] - mean, CCI_CONSTANT * mean_dev, 0.0))
        })
        .collect();
    simple_series(IndicatorType::Cci(period), bars, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::testing::bars_from_closes;
    use approx::assert_relative_eq;

    #[test]
    fn cci_flat_is_zero() {
        let series = calculate_cci(&bars_from_closes(&[10.0; 25]), 20);
        assert!(!series.values[18].valid);
        assert_relative_eq!(series.latest_simple().unwrap(), 0.0);
    }

    #[test]
    fn cci_known_window() {
        // tp 1,2,3: mean 2, mean dev 2/3; last = (3-2)/(0.015*2/3) = 100
        let series = calculate_cci(&bars_from_closes(&[1.0, 2.0, 3.0]), 3);
        assert_relative_eq!(series.latest_simple().unwrap(), 100.0, epsilon = 1e-9);
    }
}
