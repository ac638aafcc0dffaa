//! Aroon up / down / oscillator.
//!
//! Over the trailing n+1 bars: up = 100 * (n - bars since highest high) / n,
//! down likewise for the lowest low; ties resolve to the most recent bar.
//! Oscillator = up − down. Warmup: first n bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_aroon(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if period == 0 || i < period {
                return IndicatorPoint {
                    timestamp: bar.timestamp,
                    valid: false,
                    value: IndicatorValue::Aroon {
                        up: 0.0,
                        down: 0.0,
                        oscillator: 0.0,
                    },
                };
            }
            let window = &bars[i - period..=i];
            let mut hi_idx = 0;
            let mut lo_idx = 0;
            for (j, b) in window.iter().enumerate() {
                if b.high >= window[hi_idx].high {
                    hi_idx = j;
                }
                if b.low <= window[lo_idx].low {
                    lo_idx = j;
                }
            }
            let n = period as f64;
            let up = (n - (period - hi_idx) as f64) / n * 100.0;
            let down = (n - (period - lo_idx) as f64) / n * 100.0;
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Aroon {
                    up,
                    down,
                    oscillator: up - down,
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Aroon(period),
        values,
    }
}
