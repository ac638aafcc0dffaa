//! ATR (Average True Range), Wilder smoothing.
//!
//! TR[0] = high - low; TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! Seed is the mean of the first n true ranges, then
//! ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{simple_series, true_ranges, wilder_smooth};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let tr = true_ranges(bars);
    simple_series(IndicatorType::Atr(period), bars, &wilder_smooth(&tr, period, 0))
}

/// ATR as a percentage of the close, per bar.
pub fn atr_percent(bars: &[OhlcvBar], atr: &IndicatorSeries) -> Vec<Option<f64>> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            atr.simple_at(i)
                .filter(|_| bar.close != 0.0)
                .map(|v| v / bar.close * 100.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::testing::bars_hlcv;
    use approx::assert_relative_eq;

    #[test]
    fn atr_basic() {
        let bars = bars_hlcv(&[(110.0, 90.0, 100.0, 1.0); 5]);
        let series = calculate_atr(&bars, 3);
        assert_eq!(series.values.len(), 5);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert_relative_eq!(series.latest_simple().unwrap(), 20.0);
    }

    #[test]
    fn atr_wilder_smoothing() {
        let bars = bars_hlcv(&[
            (110.0, 100.0, 105.0, 1.0),
            (115.0, 105.0, 110.0, 1.0),
            (120.0, 110.0, 115.0, 1.0),
            (135.0, 115.0, 120.0, 1.0),
        ]);
        let series = calculate_atr(&bars, 3);
        assert_relative_eq!(series.simple_at(2).unwrap(), 10.0);
        // TR[3] = max(20, |135-115|, |115-115|) = 20
        assert_relative_eq!(series.simple_at(3).unwrap(), (10.0 * 2.0 + 20.0) / 3.0);
    }

    #[test]
    fn atr_handles_gaps() {
        let bars = bars_hlcv(&[
            (110.0, 100.0, 105.0, 1.0),
            (130.0, 120.0, 125.0, 1.0),
        ]);
        let series = calculate_atr(&bars, 2);
        // TR[1] = |130 - 105| = 25
        assert_relative_eq!(series.simple_at(1).unwrap(), (10.0 + 25.0) / 2.0);
    }

    #[test]
    fn atr_percent_scales_by_close() {
        let bars = bars_hlcv(&[(110.0, 90.0, 100.0, 1.0); 3]);
        let series = calculate_atr(&bars, 2);
        let pct = atr_percent(&bars, &series);
        assert_eq!(pct[0], None);
        assert_relative_eq!(pct[2].unwrap(), 20.0);
    }
}
