//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::stddev::mean_and_stddev;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let mult = stddev_mult_x100 as f64 / 100.0;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let valid = period > 0 && i + 1 >= period;
            let (upper, middle, lower) = if valid {
                let (mean, sd) = mean_and_stddev(&closes[i + 1 - period..=i]);
                (mean + mult * sd, mean, mean - mult * sd)
            } else {
                (0.0, 0.0, 0.0)
            };
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid,
                value: IndicatorValue::Band {
                    upper,
                    middle,
                    lower,
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::testing::bars_from_closes;
    use approx::assert_relative_eq;

    #[test]
    fn bollinger_warmup() {
        let bars = bars_from_closes(&[1.0, 2.0, 3.0, 4.0]);
        let series = calculate_bollinger(&bars, 3, 200);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
    }

    #[test]
    fn bollinger_bands_symmetric_around_sma() {
        let bars = bars_from_closes(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let series = calculate_bollinger(&bars, 8, 200);
        match series.latest() {
            Some(IndicatorValue::Band {
                upper,
                middle,
                lower,
            }) => {
                assert_relative_eq!(*middle, 5.0);
                assert_relative_eq!(*upper, 9.0, epsilon = 1e-12);
                assert_relative_eq!(*lower, 1.0, epsilon = 1e-12);
            }
            other => panic!("expected band, got {other:?}"),
        }
    }

    #[test]
    fn bollinger_flat_prices_collapse() {
        let bars = bars_from_closes(&[10.0; 5]);
        let series = calculate_bollinger(&bars, 3, 200);
        if let Some(IndicatorValue::Band { upper, lower, .. }) = series.latest() {
            assert_relative_eq!(*upper, *lower);
        } else {
            panic!("expected band");
        }
    }
}
