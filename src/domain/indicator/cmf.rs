//! CMF (Chaikin Money Flow).
//!
//! MFM = ((C-L) - (H-C)) / (H-L), 0 on a zero-range bar.
//! CMF = sum(MFM * V, n) / sum(V, n), 0 when the window has no volume.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{safe_div, simple_series};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_cmf(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mfv: Vec<f64> = bars
        .iter()
        .map(|b| {
            let mfm = safe_div((b.close - b.low) - (b.high - b.close), b.high - b.low, 0.0);
            mfm * b.volume
        })
        .collect();
    let values: Vec<Option<f64>> = (0..bars.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                return None;
            }
            let start = i + 1 - period;
            let flow: f64 = mfv[start..=i].iter().sum();
            let volume: f64 = bars[start..=i].iter().map(|b| b.volume).sum();
            Some(safe_div(flow, volume, 0.0))
        })
        .collect();
    simple_series(IndicatorType::Cmf(period), bars, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::testing::bars_hlcv;
    use approx::assert_relative_eq;

    #[test]
    fn cmf_closing_at_high_is_one() {
        let bars = bars_hlcv(&[(12.0, 10.0, 12.0, 500.0); 5]);
        let series = calculate_cmf(&bars, 3);
        assert!(!series.values[1].valid);
        assert_relative_eq!(series.latest_simple().unwrap(), 1.0);
    }

    #[test]
    fn cmf_zero_volume_is_zero() {
        let bars = bars_hlcv(&[(12.0, 10.0, 11.0, 0.0); 5]);
        assert_relative_eq!(calculate_cmf(&bars, 3).latest_simple().unwrap(), 0.0);
    }

    #[test]
    fn cmf_closing_at_low_is_minus_one() {
        let bars = bars_hlcv(&[(12.0, 10.0, 10.0, 100.0); 4]);
        assert_relative_eq!(calculate_cmf(&bars, 4).latest_simple().unwrap(), -1.0);
    }
}
