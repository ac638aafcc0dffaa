//! OBV (On-Balance Volume) indicator implementation.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::simple_series;
use crate::domain::ohlcv::OhlcvBar;
use std::cmp::Ordering;

/// Calculate OBV (On-Balance Volume) indicator.
///
/// OBV[0] = volume[0]
/// If close[i] > close[i-1]: OBV[i] = OBV[i-1] + volume[i]
/// If close[i] < close[i-1]: OBV[i] = OBV[i-1] - volume[i]
/// If close[i] == close[i-1]: OBV[i] = OBV[i-1]
///
/// No warmup period; all bars are valid.
pub fn calculate_obv(bars: &[OhlcvBar]) -> IndicatorSeries {
    let mut obv = 0.0;
    let values: Vec<Option<f64>> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                obv = bar.volume;
            } else {
                match bar.close.partial_cmp(&bars[i - 1].close) {
                    Some(Ordering::Greater) => obv += bar.volume,
                    Some(Ordering::Less) => obv -= bar.volume,
                    _ => {}
                }
            }
            Some(obv)
        })
        .collect();
    simple_series(IndicatorType::Obv, bars, &values)
}
