//! Keltner channels: EMA(n) of close ± mult × EMA(n) of true range.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::{ema_of, true_ranges};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_keltner(bars: &[OhlcvBar], period: usize, atr_mult_x100: u32) -> IndicatorSeries {
    let mult = atr_mult_x100 as f64 / 100.0;
    let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
    let ranges: Vec<Option<f64>> = true_ranges(bars).into_iter().map(Some).collect();
    let middle = ema_of(&closes, period);
    let band = ema_of(&ranges, period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (middle[i], band[i]) {
            (Some(m), Some(r)) => IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Band {
                    upper: m + mult * r,
                    middle: m,
                    lower: m - mult * r,
                },
            },
            _ => IndicatorPoint {
                timestamp: bar.timestamp,
                valid: false,
                value: IndicatorValue::Band {
                    upper: 0.0,
                    middle: 0.0,
                    lower: 0.0,
                },
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Keltner {
            period,
            atr_mult_x100,
        },
        values,
    }
}
