//! ROC (Rate of Change) indicator implementation.
//!
//! ROC(n)[i] = ((C[i] - C[i-n]) / C[i-n]) * 100
//! If C[i-n] == 0: ROC = 0
//! Warmup: first n bars invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{safe_div, simple_series};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_roc(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let values: Vec<Option<f64>> = (0..bars.len())
        .map(|i| {
            if period == 0 || i < period {
                return None;
            }
            let prev = bars[i - period].close;
            Some(safe_div(bars[i].close - prev, prev, 0.0) * 100.0)
        })
        .collect();
    simple_series(IndicatorType::Roc(period), bars, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::testing::bars_from_closes;
    use approx::assert_relative_eq;

    #[test]
    fn roc_basic() {
        let bars = bars_from_closes(&[100.0, 105.0, 110.0, 120.0]);
        let series = calculate_roc(&bars, 2);
        assert!(!series.values[1].valid);
        assert_relative_eq!(series.simple_at(2).unwrap(), 10.0);
        assert_relative_eq!(series.simple_at(3).unwrap(), (120.0 - 105.0) / 105.0 * 100.0);
    }

    #[test]
    fn roc_negative() {
        let series = calculate_roc(&bars_from_closes(&[100.0, 80.0]), 1);
        assert_relative_eq!(series.latest_simple().unwrap(), -20.0);
    }

    #[test]
    fn roc_zero_base_is_zero() {
        let series = calculate_roc(&bars_from_closes(&[0.0, 5.0]), 1);
        assert_relative_eq!(series.latest_simple().unwrap(), 0.0);
    }
}
