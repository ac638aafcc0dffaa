//! Market regime classification of the benchmark.
//!
//! Decision order, first match wins:
//! 1. ADX below the trend threshold is LATERAL whatever the EMA ordering.
//! 2. close > EMA50 > EMA100 with RSI > 50 is ALCISTA.
//! 3. close < EMA50 < EMA100 with RSI < 50 is BAJISTA.
//! 4. Anything else is LATERAL.
//!
//! confidence = clamp(40 + 1.5·|ADX − adx_trend| + |RSI − 50|, 0, 100)

use crate::domain::error::RadarError;
use crate::domain::indicator::IndicatorSet;
use crate::domain::ohlcv::TimeSeries;
use crate::domain::thresholds::Thresholds;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    Alcista,
    Bajista,
    Lateral,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Regime::Alcista => "ALCISTA",
            Regime::Bajista => "BAJISTA",
            Regime::Lateral => "LATERAL",
        })
    }
}

/// Benchmark readings a regime was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegimeReadings {
    pub close: f64,
    pub ema50: f64,
    pub ema100: f64,
    pub rsi: f64,
    pub adx: f64,
}

/// Classified regime; built once per cycle and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeState {
    pub benchmark: String,
    pub regime: Regime,
    pub confidence: f64,
    pub readings: RegimeReadings,
}

pub fn confidence(readings: &RegimeReadings, thresholds: &Thresholds) -> f64 {
    let raw = 40.0 + 1.5 * (readings.adx - thresholds.adx_trend).abs() + (readings.rsi - 50.0).abs();
    raw.clamp(0.0, 100.0)
}

pub fn classify_values(
    benchmark: &str,
    readings: RegimeReadings,
    thresholds: &Thresholds,
) -> RegimeState {
    let RegimeReadings {
        close,
        ema50,
        ema100,
        rsi,
        adx,
    } = readings;

    let regime = if adx < thresholds.adx_trend {
        Regime::Lateral
    } else if close > ema50 && ema50 > ema100 && rsi > 50.0 {
        Regime::Alcista
    } else if close < ema50 && ema50 < ema100 && rsi < 50.0 {
        Regime::Bajista
    } else {
        Regime::Lateral
    };

    RegimeState {
        benchmark: benchmark.to_string(),
        regime,
        confidence: confidence(&readings, thresholds),
        readings,
    }
}

/// Classify the benchmark from its latest readings. The latest ADX, EMA50,
/// EMA100 and RSI must all be past warm-up.
pub fn classify(
    series: &TimeSeries,
    indicators: &IndicatorSet,
    thresholds: &Thresholds,
) -> Result<RegimeState, RadarError> {
    let missing = |name: &str| RadarError::computation(&series.ticker, format!("{name} not defined on the latest bar"));
    let latest = indicators.latest();
    let close = series.last().map(|b| b.close).ok_or_else(|| missing("close"))?;
    let readings = RegimeReadings {
        close,
        ema50: latest.ema50.ok_or_else(|| missing("EMA50"))?,
        ema100: latest.ema100.ok_or_else(|| missing("EMA100"))?,
        rsi: latest.rsi14.ok_or_else(|| missing("RSI"))?,
        adx: latest.adx.ok_or_else(|| missing("ADX"))?,
    };

    let state = classify_values(&series.ticker, readings, thresholds);
    tracing::info!(
        benchmark = %series.ticker,
        regime = %state.regime,
        confidence = state.confidence,
        adx = readings.adx,
        rsi = readings.rsi,
        "regime classified"
    );
    Ok(state)
}
