//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values aligned to the bars
//!
//! Each indicator lives in its own submodule as a `calculate_*` function over
//! a bar slice; [`set::compute`] runs the full battery into an
//! [`set::IndicatorSet`].

pub mod adx;
pub mod aroon;
pub mod atr;
pub mod bollinger;
pub mod cci;
pub mod cmf;
pub mod donchian;
pub mod ema;
pub mod fibonacci;
pub mod keltner;
pub mod macd;
pub mod obv;
pub mod roc;
pub mod rsi;
pub mod set;
pub mod sma;
pub mod stddev;
pub mod stochastic;
pub mod vwap;

pub use ema::calculate_ema;
pub use set::{IndicatorSet, compute};
pub use sma::calculate_sma;

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
    Band {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Directional {
        adx: f64,
        plus_di: f64,
        minus_di: f64,
    },
    Aroon {
        up: f64,
        down: f64,
        oscillator: f64,
    },
}

impl IndicatorValue {
    pub fn as_simple(&self) -> Option<f64> {
        match self {
            IndicatorValue::Simple(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        match *self {
            IndicatorValue::Simple(v) => v.is_finite(),
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => line.is_finite() && signal.is_finite() && histogram.is_finite(),
            IndicatorValue::Stochastic { k, d } => k.is_finite() && d.is_finite(),
            IndicatorValue::Band {
                upper,
                middle,
                lower,
            } => upper.is_finite() && middle.is_finite() && lower.is_finite(),
            IndicatorValue::Directional {
                adx,
                plus_di,
                minus_di,
            } => adx.is_finite() && plus_di.is_finite() && minus_di.is_finite(),
            IndicatorValue::Aroon {
                up,
                down,
                oscillator,
            } => up.is_finite() && down.is_finite() && oscillator.is_finite(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    VolumeSma(usize),
    Rsi(usize),
    Roc(usize),
    Atr(usize),
    Stddev(usize),
    Cci(usize),
    Cmf(usize),
    Donchian(usize),
    Adx(usize),
    Aroon(usize),
    Obv,
    Vwap,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        k_smooth: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    Keltner {
        period: usize,
        atr_mult_x100: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index` if that point is past the warm-up.
    pub fn valid_at(&self, index: usize) -> Option<&IndicatorValue> {
        self.values
            .get(index)
            .filter(|p| p.valid)
            .map(|p| &p.value)
    }

    pub fn simple_at(&self, index: usize) -> Option<f64> {
        self.valid_at(index).and_then(IndicatorValue::as_simple)
    }

    pub fn latest(&self) -> Option<&IndicatorValue> {
        self.values.len().checked_sub(1).and_then(|i| self.valid_at(i))
    }

    pub fn latest_simple(&self) -> Option<f64> {
        self.latest().and_then(IndicatorValue::as_simple)
    }

    /// Value `back` bars before the latest one (0 = latest).
    pub fn back(&self, back: usize) -> Option<&IndicatorValue> {
        self.values
            .len()
            .checked_sub(1 + back)
            .and_then(|i| self.valid_at(i))
    }

    /// Index of the first valid point holding a non-finite number.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.values
            .iter()
            .position(|p| p.valid && !p.value.is_finite())
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::VolumeSma(period) => write!(f, "VOLUME_SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Roc(period) => write!(f, "ROC({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Cci(period) => write!(f, "CCI({})", period),
            IndicatorType::Cmf(period) => write!(f, "CMF({})", period),
            IndicatorType::Donchian(period) => write!(f, "DONCHIAN({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Aroon(period) => write!(f, "AROON({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Vwap => write!(f, "VWAP"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic {
                k_period,
                k_smooth,
                d_period,
            } => write!(f, "STOCHASTIC({},{},{})", k_period, k_smooth, d_period),
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::Keltner {
                period,
                atr_mult_x100,
            } => {
                let mult = *atr_mult_x100 as f64 / 100.0;
                write!(f, "KELTNER({},{})", period, mult)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(day: u32, valid: bool, v: f64) -> IndicatorPoint {
        IndicatorPoint {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            valid,
            value: IndicatorValue::Simple(v),
        }
    }

    #[test]
    fn indicator_type_display_sma() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
    }

    #[test]
    fn indicator_type_display_macd() {
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn indicator_type_display_bands() {
        let boll = IndicatorType::Bollinger {
            period: 20,
            stddev_mult_x100: 200,
        };
        assert_eq!(boll.to_string(), "BOLLINGER(20,2)");
        let kc = IndicatorType::Keltner {
            period: 20,
            atr_mult_x100: 150,
        };
        assert_eq!(kc.to_string(), "KELTNER(20,1.5)");
    }

    #[test]
    fn series_accessors_skip_warmup() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Sma(2),
            values: vec![point(1, false, 0.0), point(2, true, 5.0), point(3, true, 6.0)],
        };
        assert_eq!(series.simple_at(0), None);
        assert_eq!(series.simple_at(1), Some(5.0));
        assert_eq!(series.latest_simple(), Some(6.0));
        assert_eq!(series.back(1).and_then(IndicatorValue::as_simple), Some(5.0));
        assert_eq!(series.back(2), None);
        assert_eq!(series.back(9), None);
    }

    #[test]
    fn non_finite_only_counts_valid_points() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Rsi(14),
            values: vec![point(1, false, f64::NAN), point(2, true, 1.0), point(3, true, f64::INFINITY)],
        };
        assert_eq!(series.first_non_finite(), Some(2));
    }

    #[test]
    fn composite_values_check_every_field() {
        let v = IndicatorValue::Band {
            upper: 1.0,
            middle: f64::NAN,
            lower: 0.0,
        };
        assert!(!v.is_finite());
        assert_eq!(v.as_simple(), None);
    }
}
