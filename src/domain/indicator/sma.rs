//! Simple Moving Average over closes, and the 20-bar volume average.
//!
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{rolling_mean, simple_series};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    simple_series(IndicatorType::Sma(period), bars, &rolling_mean(&closes, period))
}

pub fn calculate_volume_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    simple_series(
        IndicatorType::VolumeSma(period),
        bars,
        &rolling_mean(&volumes, period),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::testing::{bars_from_closes, bars_hlcv};
    use approx::assert_relative_eq;

    #[test]
    fn sma_basic() {
        let bars = bars_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let series = calculate_sma(&bars, 3);
        assert!(!series.values[1].valid);
        assert_relative_eq!(series.simple_at(2).unwrap(), 2.0);
        assert_relative_eq!(series.simple_at(4).unwrap(), 4.0);
    }

    #[test]
    fn volume_sma_uses_volume() {
        let bars = bars_hlcv(&[(1.0, 1.0, 1.0, 100.0), (1.0, 1.0, 1.0, 200.0), (1.0, 1.0, 1.0, 600.0)]);
        let series = calculate_volume_sma(&bars, 3);
        assert_relative_eq!(series.latest_simple().unwrap(), 300.0);
        assert_eq!(series.indicator_type, IndicatorType::VolumeSma(3));
    }
}
