//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{ema_of, simple_series};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
    simple_series(IndicatorType::Ema(period), bars, &ema_of(&closes, period))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::testing::bars_from_closes;
    use approx::assert_relative_eq;

    #[test]
    fn ema_warmup() {
        let bars = bars_from_closes(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn ema_seed_is_sma() {
        let bars = bars_from_closes(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 3);
        assert_relative_eq!(series.simple_at(2).unwrap(), 20.0);
    }

    #[test]
    fn ema_recursive_calculation() {
        let bars = bars_from_closes(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3);

        let k = 2.0 / 4.0;
        let ema_3 = 40.0 * k + 20.0 * (1.0 - k);
        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);
        assert_relative_eq!(series.simple_at(3).unwrap(), ema_3);
        assert_relative_eq!(series.simple_at(4).unwrap(), ema_4);
    }

    #[test]
    fn ema_equal_prices() {
        let bars = bars_from_closes(&[100.0; 8]);
        let series = calculate_ema(&bars, 3);
        for i in 2..8 {
            assert_relative_eq!(series.simple_at(i).unwrap(), 100.0);
        }
    }

    #[test]
    fn ema_longer_than_input_is_all_invalid() {
        let bars = bars_from_closes(&[10.0, 20.0]);
        let series = calculate_ema(&bars, 5);
        assert_eq!(series.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
        assert_eq!(series.indicator_type, IndicatorType::Ema(5));
    }

    #[test]
    fn ema_period_0() {
        let bars = bars_from_closes(&[10.0, 20.0]);
        let series = calculate_ema(&bars, 0);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}
