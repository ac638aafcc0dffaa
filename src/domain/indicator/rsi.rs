//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are invalid (need n price changes to compute initial average).

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{simple_series, wilder_smooth};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut gains = vec![0.0; bars.len()];
    let mut losses = vec![0.0; bars.len()];
    for i in 1..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        gains[i] = change.max(0.0);
        losses[i] = (-change).max(0.0);
    }

    let avg_gain = wilder_smooth(&gains, period, 1);
    let avg_loss = wilder_smooth(&losses, period, 1);

    let values: Vec<Option<f64>> = avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(g, l)| match (g, l) {
            (Some(_), Some(l)) if *l == 0.0 => Some(100.0),
            (Some(g), Some(l)) => Some(100.0 - (100.0 / (1.0 + g / l))),
            _ => None,
        })
        .collect();

    simple_series(IndicatorType::Rsi(period), bars, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::testing::bars_from_closes;
    use approx::assert_relative_eq;

    #[test]
    fn rsi_warmup_is_period_bars() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&bars_from_closes(&closes), 14);
        assert!(!series.values[13].valid);
        assert!(series.values[14].valid);
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&bars_from_closes(&closes), 14);
        assert_relative_eq!(series.latest_simple().unwrap(), 100.0);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&bars_from_closes(&closes), 14);
        assert_relative_eq!(series.latest_simple().unwrap(), 0.0);
    }

    #[test]
    fn rsi_flat_prices_is_100() {
        let series = calculate_rsi(&bars_from_closes(&[50.0; 20]), 14);
        assert_relative_eq!(series.latest_simple().unwrap(), 100.0);
    }

    #[test]
    fn rsi_alternating_is_midrange() {
        let closes: Vec<f64> = (0..30)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let rsi = calculate_rsi(&bars_from_closes(&closes), 14)
            .latest_simple()
            .unwrap();
        assert!((40.0..=60.0).contains(&rsi), "rsi = {rsi}");
    }

    #[test]
    fn rsi_wilder_step() {
        // period 2: changes +2, -1, then +3
        let series = calculate_rsi(&bars_from_closes(&[10.0, 12.0, 11.0, 14.0]), 2);
        let avg_gain = (1.0 * 1.0 + 3.0) / 2.0;
        let avg_loss = (0.5 * 1.0 + 0.0) / 2.0;
        let expected = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        assert_relative_eq!(series.simple_at(3).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn rsi_short_input_all_invalid() {
        let series = calculate_rsi(&bars_from_closes(&[1.0]), 14);
        assert_eq!(series.len(), 1);
        assert!(!series.values[0].valid);
    }
}
