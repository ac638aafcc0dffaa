//! Donchian channel: highest high, lowest low and their midpoint over n bars.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::{rolling_max, rolling_min};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_donchian(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let hh = rolling_max(&highs, period);
    let ll = rolling_min(&lows, period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let (valid, upper, lower) = match (hh[i], ll[i]) {
                (Some(h), Some(l)) => (true, h, l),
                _ => (false, 0.0, 0.0),
            };
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid,
                value: IndicatorValue::Band {
                    upper,
                    middle: (upper + lower) / 2.0,
                    lower,
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Donchian(period),
        values,
    }
}
