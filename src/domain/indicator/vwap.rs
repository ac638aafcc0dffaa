//! VWAP anchored to each calendar day.
//!
//! Cumulative sum(TP * V) / sum(V) since the first bar of the day; falls
//! back to the typical price while the day has no volume. No warmup.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::simple_series;
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_vwap(bars: &[OhlcvBar]) -> IndicatorSeries {
    let mut day = None;
    let mut pv = 0.0;
    let mut vol = 0.0;
    let values: Vec<Option<f64>> = bars
        .iter()
        .map(|bar| {
            let date = bar.timestamp.date();
            if day != Some(date) {
                day = Some(date);
                pv = 0.0;
                vol = 0.0;
            }
            let tp = bar.typical_price();
            pv += tp * bar.volume;
            vol += bar.volume;
            Some(if vol == 0.0 { tp } else { pv / vol })
        })
        .collect();
    simple_series(IndicatorType::Vwap, bars, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn intraday(day: u32, hour: u32, price: f64, volume: f64) -> OhlcvBar {
        OhlcvBar {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }

    #[test]
    fn vwap_weights_by_volume_within_day() {
        let bars = vec![intraday(4, 10, 10.0, 100.0), intraday(4, 11, 20.0, 300.0)];
        let series = calculate_vwap(&bars);
        assert_eq!(series.simple_at(0), Some(10.0));
        assert_eq!(series.simple_at(1), Some((1000.0 + 6000.0) / 400.0));
    }

    #[test]
    fn vwap_resets_each_day() {
        let bars = vec![
            intraday(4, 10, 10.0, 100.0),
            intraday(4, 11, 20.0, 100.0),
            intraday(5, 10, 30.0, 100.0),
        ];
        let series = calculate_vwap(&bars);
        assert_eq!(series.simple_at(2), Some(30.0));
    }

    #[test]
    fn vwap_zero_volume_uses_typical_price() {
        let series = calculate_vwap(&[intraday(4, 10, 12.0, 0.0)]);
        assert_eq!(series.latest_simple(), Some(12.0));
    }
}
