//! The full indicator battery over one validated series.

use crate::domain::error::RadarError;
use crate::domain::indicator::adx::calculate_adx;
use crate::domain::indicator::aroon::calculate_aroon;
use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::cci::calculate_cci;
use crate::domain::indicator::cmf::calculate_cmf;
use crate::domain::indicator::donchian::calculate_donchian;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::fibonacci::{FIBONACCI_LOOKBACK, FibonacciLevels, calculate_fibonacci};
use crate::domain::indicator::keltner::calculate_keltner;
use crate::domain::indicator::macd::calculate_macd_default;
use crate::domain::indicator::obv::calculate_obv;
use crate::domain::indicator::roc::calculate_roc;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::{calculate_sma, calculate_volume_sma};
use crate::domain::indicator::stochastic::calculate_stochastic;
use crate::domain::indicator::vwap::calculate_vwap;
use crate::domain::indicator::{IndicatorSeries, IndicatorValue};
use crate::domain::ohlcv::{MIN_BARS, TimeSeries};
use serde::Serialize;

/// One named series per indicator, each aligned to the input bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub ema12: IndicatorSeries,
    pub ema20: IndicatorSeries,
    pub ema26: IndicatorSeries,
    pub ema50: IndicatorSeries,
    pub ema100: IndicatorSeries,
    pub ema200: IndicatorSeries,
    pub sma20: IndicatorSeries,
    pub sma50: IndicatorSeries,
    pub sma200: IndicatorSeries,
    pub volume_sma20: IndicatorSeries,
    pub bollinger: IndicatorSeries,
    pub donchian: IndicatorSeries,
    pub keltner: IndicatorSeries,
    pub fibonacci: Option<FibonacciLevels>,
    pub rsi14: IndicatorSeries,
    pub macd: IndicatorSeries,
    pub stochastic: IndicatorSeries,
    pub roc10: IndicatorSeries,
    pub cci20: IndicatorSeries,
    pub obv: IndicatorSeries,
    pub cmf20: IndicatorSeries,
    pub vwap: IndicatorSeries,
    pub adx14: IndicatorSeries,
    pub aroon25: IndicatorSeries,
    pub atr14: IndicatorSeries,
}

impl IndicatorSet {
    fn all_series(&self) -> [&IndicatorSeries; 24] {
        [
            &self.ema12,
            &self.ema20,
            &self.ema26,
            &self.ema50,
            &self.ema100,
            &self.ema200,
            &self.sma20,
            &self.sma50,
            &self.sma200,
            &self.volume_sma20,
            &self.bollinger,
            &self.donchian,
            &self.keltner,
            &self.rsi14,
            &self.macd,
            &self.stochastic,
            &self.roc10,
            &self.cci20,
            &self.obv,
            &self.cmf20,
            &self.vwap,
            &self.adx14,
            &self.aroon25,
            &self.atr14,
        ]
    }

    pub fn len(&self) -> usize {
        self.ema12.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ema12.is_empty()
    }

    /// Snapshot of the latest readings, `None` where still warming up.
    pub fn latest(&self) -> LatestReadings {
        let (macd_line, macd_signal, macd_histogram) = match self.macd.latest() {
            Some(IndicatorValue::Macd {
                line,
                signal,
                histogram,
            }) => (Some(*line), Some(*signal), Some(*histogram)),
            _ => (None, None, None),
        };
        let (adx, plus_di, minus_di) = match self.adx14.latest() {
            Some(IndicatorValue::Directional {
                adx,
                plus_di,
                minus_di,
            }) => (Some(*adx), Some(*plus_di), Some(*minus_di)),
            _ => (None, None, None),
        };
        let (stoch_k, stoch_d) = match self.stochastic.latest() {
            Some(IndicatorValue::Stochastic { k, d }) => (Some(*k), Some(*d)),
            _ => (None, None),
        };
        let (bb_upper, bb_middle, bb_lower) = match self.bollinger.latest() {
            Some(IndicatorValue::Band {
                upper,
                middle,
                lower,
            }) => (Some(*upper), Some(*middle), Some(*lower)),
            _ => (None, None, None),
        };
        let aroon_oscillator = match self.aroon25.latest() {
            Some(IndicatorValue::Aroon { oscillator, .. }) => Some(*oscillator),
            _ => None,
        };
        LatestReadings {
            ema12: self.ema12.latest_simple(),
            ema20: self.ema20.latest_simple(),
            ema26: self.ema26.latest_simple(),
            ema50: self.ema50.latest_simple(),
            ema100: self.ema100.latest_simple(),
            ema200: self.ema200.latest_simple(),
            sma20: self.sma20.latest_simple(),
            sma50: self.sma50.latest_simple(),
            sma200: self.sma200.latest_simple(),
            volume_sma20: self.volume_sma20.latest_simple(),
            bb_upper,
            bb_middle,
            bb_lower,
            rsi14: self.rsi14.latest_simple(),
            macd_line,
            macd_signal,
            macd_histogram,
            stoch_k,
            stoch_d,
            roc10: self.roc10.latest_simple(),
            cci20: self.cci20.latest_simple(),
            obv: self.obv.latest_simple(),
            cmf20: self.cmf20.latest_simple(),
            vwap: self.vwap.latest_simple(),
            adx,
            plus_di,
            minus_di,
            aroon_oscillator,
            atr14: self.atr14.latest_simple(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestReadings {
    pub ema12: Option<f64>,
    pub ema20: Option<f64>,
    pub ema26: Option<f64>,
    pub ema50: Option<f64>,
    pub ema100: Option<f64>,
    pub ema200: Option<f64>,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub volume_sma20: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub rsi14: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub roc10: Option<f64>,
    pub cci20: Option<f64>,
    pub obv: Option<f64>,
    pub cmf20: Option<f64>,
    pub vwap: Option<f64>,
    pub adx: Option<f64>,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub aroon_oscillator: Option<f64>,
    pub atr14: Option<f64>,
}

/// Compute every indicator over `series`.
///
/// Fails with a computation error when the series is shorter than the
/// minimum usable length or when any past-warm-up point is not finite.
pub fn compute(series: &TimeSeries) -> Result<IndicatorSet, RadarError> {
    if series.len() < MIN_BARS {
        return Err(RadarError::computation(
            &series.ticker,
            format!("{} bars, at least {} required", series.len(), MIN_BARS),
        ));
    }
    let bars = &series.bars;

    let set = IndicatorSet {
        ema12: calculate_ema(bars, 12),
        ema20: calculate_ema(bars, 20),
        ema26: calculate_ema(bars, 26),
        ema50: calculate_ema(bars, 50),
        ema100: calculate_ema(bars, 100),
        ema200: calculate_ema(bars, 200),
        sma20: calculate_sma(bars, 20),
        sma50: calculate_sma(bars, 50),
        sma200: calculate_sma(bars, 200),
        volume_sma20: calculate_volume_sma(bars, 20),
        bollinger: calculate_bollinger(bars, 20, 200),
        donchian: calculate_donchian(bars, 20),
        keltner: calculate_keltner(bars, 20, 200),
        fibonacci: calculate_fibonacci(bars, FIBONACCI_LOOKBACK),
        rsi14: calculate_rsi(bars, 14),
        macd: calculate_macd_default(bars),
        stochastic: calculate_stochastic(bars, 14, 3, 3),
        roc10: calculate_roc(bars, 10),
        cci20: calculate_cci(bars, 20),
        obv: calculate_obv(bars),
        cmf20: calculate_cmf(bars, 20),
        vwap: calculate_vwap(bars),
        adx14: calculate_adx(bars, 14),
        aroon25: calculate_aroon(bars, 25),
        atr14: calculate_atr(bars, 14),
    };

    for indicator in set.all_series() {
        if let Some(index) = indicator.first_non_finite() {
            return Err(RadarError::computation(
                &series.ticker,
                format!(
                    "{} produced a non-finite value at bar {}",
                    indicator.indicator_type, index
                ),
            ));
        }
    }
    if let Some(fib) = &set.fibonacci {
        if fib.levels().iter().any(|(_, v)| !v.is_finite()) {
            return Err(RadarError::computation(
                &series.ticker,
                "FIBONACCI produced a non-finite level",
            ));
        }
    }

    tracing::debug!(ticker = %series.ticker, bars = series.len(), "indicators computed");
    Ok(set)
}
