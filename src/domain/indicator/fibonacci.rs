//! Fibonacci retracement levels over the recent swing range.

use crate::domain::ohlcv::OhlcvBar;
use serde::Serialize;

pub const FIBONACCI_LOOKBACK: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FibonacciLevels {
    pub swing_high: f64,
    pub swing_low: f64,
    pub level_236: f64,
    pub level_382: f64,
    pub level_500: f64,
    pub level_618: f64,
    pub level_786: f64,
}

impl FibonacciLevels {
    /// Levels as (ratio, price) pairs from the swing low upwards.
    pub fn levels(&self) -> [(f64, f64); 7] {
        [
            (0.0, self.swing_low),
            (0.236, self.level_236),
            (0.382, self.level_382),
            (0.5, self.level_500),
            (0.618, self.level_618),
            (0.786, self.level_786),
            (1.0, self.swing_high),
        ]
    }
}

/// Levels are measured upward from the lowest low of the last `lookback`
/// bars. `None` when fewer bars are available.
pub fn calculate_fibonacci(bars: &[OhlcvBar], lookback: usize) -> Option<FibonacciLevels> {
    if lookback == 0 || bars.len() < lookback {
        return None;
    }
    let window = &bars[bars.len() - lookback..];
    let high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let range = high - low;
    Some(FibonacciLevels {
        swing_high: high,
        swing_low: low,
        level_236: low + 0.236 * range,
        level_382: low + 0.382 * range,
        level_500: low + 0.5 * range,
        level_618: low + 0.618 * range,
        level_786: low + 0.786 * range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::testing::bars_hlcv;
    use approx::assert_relative_eq;

    #[test]
    fn fibonacci_requires_lookback() {
        let bars = bars_hlcv(&[(11.0, 9.0, 10.0, 1.0); 49]);
        assert!(calculate_fibonacci(&bars, FIBONACCI_LOOKBACK).is_none());
    }

    #[test]
    fn fibonacci_levels_between_extremes() {
        let mut rows = vec![(110.0, 100.0, 105.0, 1.0); 50];
        rows[10] = (200.0, 150.0, 180.0, 1.0);
        let levels = calculate_fibonacci(&bars_hlcv(&rows), FIBONACCI_LOOKBACK).unwrap();
        assert_relative_eq!(levels.swing_high, 200.0);
        assert_relative_eq!(levels.swing_low, 100.0);
        assert_relative_eq!(levels.level_500, 150.0);
        assert_relative_eq!(levels.level_618, 161.8, epsilon = 1e-9);
        assert!(levels.levels().windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn fibonacci_uses_only_recent_bars() {
        let mut rows = vec![(110.0, 100.0, 105.0, 1.0); 60];
        rows[0] = (500.0, 1.0, 200.0, 1.0);
        let levels = calculate_fibonacci(&bars_hlcv(&rows), FIBONACCI_LOOKBACK).unwrap();
        assert_relative_eq!(levels.swing_high, 110.0);
    }
}
