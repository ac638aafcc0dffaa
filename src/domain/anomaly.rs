//! Statistical anomaly and pattern-probability alerts for one instrument.

use crate::domain::indicator::atr::atr_percent;
use crate::domain::indicator::set::LatestReadings;
use crate::domain::indicator::{IndicatorSeries, IndicatorSet, IndicatorValue};
use crate::domain::ohlcv::TimeSeries;
use crate::domain::thresholds::Thresholds;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Trailing window for the instrument-relative ATR% baseline.
pub const VOLATILITY_BASELINE: usize = 50;
/// Rolling window of the return correlation with the paired reference.
pub const CORRELATION_WINDOW: usize = 20;
/// Bars inspected for divergences, split into two halves.
pub const DIVERGENCE_LOOKBACK: usize = 14;
/// RSI beyond these bounds is reported as an extreme reading.
const RSI_EXTREME_HIGH: f64 = 75.0;
const RSI_EXTREME_LOW: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    Anomaly,
    Opportunity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSubtype {
    VolatilidadAumentada,
    VolumenAlto,
    VolumenBajo,
    CambioPrecioAbrupto,
    CorrelacionRota,
    RsiSobrecompra,
    RsiSobreventa,
    PatronAlcista,
    PatronBajista,
    DivergenciaAlcistaRsi,
    DivergenciaBajistaRsi,
    DivergenciaAlcistaMacd,
    DivergenciaBajistaMacd,
}

impl AlertSubtype {
    pub fn kind(self) -> AlertKind {
        match self {
            AlertSubtype::PatronAlcista
            | AlertSubtype::PatronBajista
            | AlertSubtype::DivergenciaAlcistaRsi
            | AlertSubtype::DivergenciaBajistaRsi
            | AlertSubtype::DivergenciaAlcistaMacd
            | AlertSubtype::DivergenciaBajistaMacd => AlertKind::Opportunity,
            _ => AlertKind::Anomaly,
        }
    }
}

impl fmt::Display for AlertSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertSubtype::VolatilidadAumentada => "VOLATILIDAD_AUMENTADA",
            AlertSubtype::VolumenAlto => "VOLUMEN_ALTO",
            AlertSubtype::VolumenBajo => "VOLUMEN_BAJO",
            AlertSubtype::CambioPrecioAbrupto => "CAMBIO_PRECIO_ABRUPTO",
            AlertSubtype::CorrelacionRota => "CORRELACION_ROTA",
            AlertSubtype::RsiSobrecompra => "RSI_SOBRECOMPRA",
            AlertSubtype::RsiSobreventa => "RSI_SOBREVENTA",
            AlertSubtype::PatronAlcista => "PATRON_ALCISTA",
            AlertSubtype::PatronBajista => "PATRON_BAJISTA",
            AlertSubtype::DivergenciaAlcistaRsi => "DIVERGENCIA_ALCISTA_RSI",
            AlertSubtype::DivergenciaBajistaRsi => "DIVERGENCIA_BAJISTA_RSI",
            AlertSubtype::DivergenciaAlcistaMacd => "DIVERGENCIA_ALCISTA_MACD",
            AlertSubtype::DivergenciaBajistaMacd => "DIVERGENCIA_BAJISTA_MACD",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Baja,
    Media,
    Alta,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Baja => "BAJA",
            Severity::Media => "MEDIA",
            Severity::Alta => "ALTA",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub ticker: String,
    pub kind: AlertKind,
    pub subtype: AlertSubtype,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    pub message: String,
}

impl Alert {
    fn new(ticker: &str, subtype: AlertSubtype, severity: Severity, message: String) -> Self {
        Alert {
            ticker: ticker.to_string(),
            kind: subtype.kind(),
            subtype,
            severity,
            probability: None,
            message,
        }
    }
}

/// Bullish and bearish pattern probabilities, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatternProbability {
    pub bullish: f64,
    pub bearish: f64,
}

const W_EMA: f64 = 0.20;
const W_RSI: f64 = 0.15;
const W_MACD: f64 = 0.25;
const W_ADX: f64 = 0.15;
const W_VOLUME: f64 = 0.15;
const W_STOCH: f64 = 0.10;

fn unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// Weighted convergence of six normalised indicator terms. Missing readings
/// contribute nothing to either side. `bar_up` is the direction of the last
/// close-to-close move and decides which side the volume term confirms.
pub fn pattern_probability(
    latest: &LatestReadings,
    rvol: Option<f64>,
    bar_up: bool,
    t: &Thresholds,
) -> PatternProbability {
    let mut bull = 0.0;
    let mut bear = 0.0;

    let trend = match (latest.ema50, latest.ema200) {
        (Some(fast), Some(slow)) if fast > slow => Some(true),
        (Some(fast), Some(slow)) if fast < slow => Some(false),
        _ => None,
    };
    match trend {
        Some(true) => bull += W_EMA,
        Some(false) => bear += W_EMA,
        None => {}
    }

    if let Some(rsi) = latest.rsi14 {
        bull += W_RSI * unit((rsi - 50.0) / (t.rsi_overbought - 50.0));
        bear += W_RSI * unit((50.0 - rsi) / (50.0 - t.rsi_oversold));
    }

    if let Some(hist) = latest.macd_histogram {
        if hist > 0.0 {
            bull += W_MACD;
        } else if hist < 0.0 {
            bear += W_MACD;
        }
    }

    if let (Some(adx), Some(up)) = (latest.adx, trend) {
        let strength = W_ADX * unit((adx - t.adx_trend) / (t.adx_strong - t.adx_trend));
        if up {
            bull += strength;
        } else {
            bear += strength;
        }
    }

    if let Some(rvol) = rvol {
        let confirmation = W_VOLUME * unit((rvol - 1.0) / (t.breakout_volume - 1.0));
        if bar_up {
            bull += confirmation;
        } else {
            bear += confirmation;
        }
    }

    if let Some(k) = latest.stoch_k {
        if k > 60.0 {
            bull += W_STOCH;
        } else if k < 40.0 {
            bear += W_STOCH;
        }
    }

    PatternProbability {
        bullish: (bull * 100.0).clamp(0.0, 100.0),
        bearish: (bear * 100.0).clamp(0.0, 100.0),
    }
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

/// Rolling correlation of close-to-close returns over timestamps both series
/// share. Windows with a flat leg are skipped.
pub fn rolling_return_correlation(a: &TimeSeries, b: &TimeSeries, window: usize) -> Vec<f64> {
    let reference: BTreeMap<NaiveDateTime, f64> = b.bars.iter().map(|bar| (bar.timestamp, bar.close)).collect();
    let paired: Vec<(f64, f64)> = a
        .bars
        .iter()
        .filter_map(|bar| reference.get(&bar.timestamp).map(|&other| (bar.close, other)))
        .collect();
    if paired.len() < 2 {
        return Vec::new();
    }
    let returns: Vec<(f64, f64)> = paired
        .windows(2)
        .filter(|w| w[0].0 != 0.0 && w[0].1 != 0.0)
        .map(|w| (w[1].0 / w[0].0 - 1.0, w[1].1 / w[0].1 - 1.0))
        .collect();
    if returns.len() < window {
        return Vec::new();
    }
    returns
        .windows(window)
        .filter_map(|w| {
            let (x, y): (Vec<f64>, Vec<f64>) = w.iter().copied().unzip();
            pearson(&x, &y)
        })
        .collect()
}

/// (first-half extreme, second-half extreme). `None` unless every point is
/// defined.
fn halves(values: &[Option<f64>], pick_max: bool) -> Option<(f64, f64)> {
    let half = values.len() / 2;
    let fold = |slice: &[Option<f64>]| -> Option<f64> {
        let mut acc: Option<f64> = None;
        for v in slice {
            let v = (*v)?;
            acc = Some(match acc {
                None => v,
                Some(a) if pick_max => a.max(v),
                Some(a) => a.min(v),
            });
        }
        acc
    };
    Some((fold(&values[..half])?, fold(&values[half..])?))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Divergence {
    Bullish,
    Bearish,
}

/// Lower low in price with a higher low in the oscillator is bullish;
/// higher high in price with a lower high in the oscillator is bearish.
fn divergence(lows: &[Option<f64>], highs: &[Option<f64>], osc: &[Option<f64>]) -> Option<Divergence> {
    let (price_low_a, price_low_b) = halves(lows, false)?;
    let (osc_low_a, osc_low_b) = halves(osc, false)?;
    if price_low_b < price_low_a && osc_low_b > osc_low_a {
        return Some(Divergence::Bullish);
    }
    let (price_high_a, price_high_b) = halves(highs, true)?;
    let (osc_high_a, osc_high_b) = halves(osc, true)?;
    if price_high_b > price_high_a && osc_high_b < osc_high_a {
        return Some(Divergence::Bearish);
    }
    None
}

fn tail(
    series: &IndicatorSeries,
    len: usize,
    extract: impl Fn(&IndicatorSeries, usize) -> Option<f64>,
) -> Vec<Option<f64>> {
    let n = series.len();
    (n.saturating_sub(len)..n).map(|i| extract(series, i)).collect()
}

pub struct AnomalyDetector {
    thresholds: Thresholds,
}

impl AnomalyDetector {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// All anomaly and opportunity alerts for one instrument, in detection
    /// order. `reference` enables the broken-correlation check.
    pub fn detect(
        &self,
        ticker: &str,
        series: &TimeSeries,
        set: &IndicatorSet,
        reference: Option<&TimeSeries>,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();
        let n = series.len();
        if n < 2 {
            return alerts;
        }
        let t = &self.thresholds;
        let latest = set.latest();
        let last = &series.bars[n - 1];
        let prev = &series.bars[n - 2];

        self.volatility(ticker, series, set, &mut alerts);

        let rvol = latest.volume_sma20.filter(|v| *v > 0.0).map(|avg| last.volume / avg);
        if let Some(rvol) = rvol {
            if rvol > t.rvol_high {
                alerts.push(Alert::new(
                    ticker,
                    AlertSubtype::VolumenAlto,
                    Severity::Media,
                    format!("{ticker} volume is unusually high ({rvol:.1}x the 20-bar average)"),
                ));
            } else if rvol < t.rvol_low {
                alerts.push(Alert::new(
                    ticker,
                    AlertSubtype::VolumenBajo,
                    Severity::Baja,
                    format!("{ticker} volume is unusually low ({rvol:.1}x the 20-bar average)"),
                ));
            }
        }

        if prev.close > 0.0 {
            let change = (last.close - prev.close) / prev.close * 100.0;
            if change.abs() > t.abrupt_move_pct {
                let severity = if change.abs() > 2.0 * t.abrupt_move_pct {
                    Severity::Alta
                } else {
                    Severity::Media
                };
                alerts.push(Alert::new(
                    ticker,
                    AlertSubtype::CambioPrecioAbrupto,
                    severity,
                    format!("{ticker} moved {change:+.2}% in the last session"),
                ));
            }
        }

        if let Some(rsi) = latest.rsi14 {
            if rsi > RSI_EXTREME_HIGH {
                alerts.push(Alert::new(
                    ticker,
                    AlertSubtype::RsiSobrecompra,
                    Severity::Media,
                    format!("{ticker} is deeply overbought (RSI {rsi:.1})"),
                ));
            } else if rsi < RSI_EXTREME_LOW {
                alerts.push(Alert::new(
                    ticker,
                    AlertSubtype::RsiSobreventa,
                    Severity::Media,
                    format!("{ticker} is deeply oversold (RSI {rsi:.1})"),
                ));
            }
        }

        if let Some(reference) = reference {
            self.correlation(ticker, series, reference, &mut alerts);
        }

        let probability = pattern_probability(&latest, rvol, last.close >= prev.close, t);
        for (subtype, p, side) in [
            (AlertSubtype::PatronAlcista, probability.bullish, "bullish"),
            (AlertSubtype::PatronBajista, probability.bearish, "bearish"),
        ] {
            if p >= t.opportunity_floor {
                let severity = if p >= 75.0 { Severity::Alta } else { Severity::Media };
                let mut alert = Alert::new(
                    ticker,
                    subtype,
                    severity,
                    format!("{side} pattern on {ticker} with probability {p:.0}%"),
                );
                alert.probability = Some(p);
                alerts.push(alert);
            }
        }

        self.divergences(ticker, series, set, &mut alerts);

        tracing::debug!(ticker = %ticker, alerts = alerts.len(), "anomaly detection complete");
        alerts
    }

    fn volatility(&self, ticker: &str, series: &TimeSeries, set: &IndicatorSet, alerts: &mut Vec<Alert>) {
        let pct = atr_percent(&series.bars, &set.atr14);
        let Some(Some(current)) = pct.last().copied() else {
            return;
        };
        let start = pct.len().saturating_sub(VOLATILITY_BASELINE + 1);
        let history: Vec<f64> = pct[start..pct.len() - 1].iter().flatten().copied().collect();
        if history.len() < CORRELATION_WINDOW {
            return;
        }
        let baseline = history.iter().sum::<f64>() / history.len() as f64;
        if baseline <= 0.0 || current <= baseline * self.thresholds.volatility_multiplier {
            return;
        }
        let increase = (current / baseline - 1.0) * 100.0;
        let severity = if increase > 50.0 { Severity::Alta } else { Severity::Media };
        alerts.push(Alert::new(
            ticker,
            AlertSubtype::VolatilidadAumentada,
            severity,
            format!("{ticker} volatility is {increase:.0}% above its {VOLATILITY_BASELINE}-bar norm (ATR {current:.2}%)"),
        ));
    }

    fn correlation(&self, ticker: &str, series: &TimeSeries, reference: &TimeSeries, alerts: &mut Vec<Alert>) {
        let rolling = rolling_return_correlation(series, reference, CORRELATION_WINDOW);
        let Some((current, earlier)) = rolling.split_last() else {
            return;
        };
        if earlier.is_empty() {
            return;
        }
        let baseline = earlier.iter().sum::<f64>() / earlier.len() as f64;
        let drop = baseline - current;
        if drop > self.thresholds.correlation_drop {
            let severity = if drop > 2.0 * self.thresholds.correlation_drop {
                Severity::Alta
            } else {
                Severity::Media
            };
            alerts.push(Alert::new(
                ticker,
                AlertSubtype::CorrelacionRota,
                severity,
                format!(
                    "{ticker} correlation with {} fell to {current:.2} from a baseline of {baseline:.2}",
                    reference.ticker
                ),
            ));
        }
    }

    fn divergences(&self, ticker: &str, series: &TimeSeries, set: &IndicatorSet, alerts: &mut Vec<Alert>) {
        let n = series.len();
        if n < DIVERGENCE_LOOKBACK {
            return;
        }
        let window = &series.bars[n - DIVERGENCE_LOOKBACK..];
        let lows: Vec<Option<f64>> = window.iter().map(|b| Some(b.low)).collect();
        let highs: Vec<Option<f64>> = window.iter().map(|b| Some(b.high)).collect();

        let rsi = tail(&set.rsi14, DIVERGENCE_LOOKBACK, |s, i| s.simple_at(i));
        let macd = tail(&set.macd, DIVERGENCE_LOOKBACK, |s, i| match s.valid_at(i) {
            Some(IndicatorValue::Macd { line, .. }) => Some(*line),
            _ => None,
        });

        for (osc, bull, bear, name) in [
            (&rsi, AlertSubtype::DivergenciaAlcistaRsi, AlertSubtype::DivergenciaBajistaRsi, "RSI"),
            (&macd, AlertSubtype::DivergenciaAlcistaMacd, AlertSubtype::DivergenciaBajistaMacd, "MACD"),
        ] {
            match divergence(&lows, &highs, osc) {
                Some(Divergence::Bullish) => alerts.push(Alert::new(
                    ticker,
                    bull,
                    Severity::Media,
                    format!("bullish {name} divergence on {ticker}: lower price low, higher {name} low"),
                )),
                Some(Divergence::Bearish) => alerts.push(Alert::new(
                    ticker,
                    bear,
                    Severity::Media,
                    format!("bearish {name} divergence on {ticker}: higher price high, lower {name} high"),
                )),
                None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::compute;
    use crate::domain::indicator::testing::{day, wavy_bars};
    use crate::domain::ohlcv::OhlcvBar;
    use approx::assert_relative_eq;

    fn readings() -> LatestReadings {
        let set = compute(&TimeSeries::new("X", wavy_bars(30))).unwrap();
        let mut latest = set.latest();
        latest.ema50 = None;
        latest.ema200 = None;
        latest.rsi14 = None;
        latest.macd_histogram = None;
        latest.adx = None;
        latest.stoch_k = None;
        latest
    }

    #[test]
    fn probability_weights_sum_to_one() {
        let latest = LatestReadings {
            ema50: Some(110.0),
            ema200: Some(100.0),
            rsi14: Some(80.0),
            macd_histogram: Some(0.5),
            adx: Some(45.0),
            stoch_k: Some(80.0),
            ..readings()
        };
        let p = pattern_probability(&latest, Some(2.0), true, &Thresholds::default());
        assert_relative_eq!(p.bullish, 100.0, epsilon = 1e-9);
        assert_relative_eq!(p.bearish, 0.0);
    }

    #[test]
    fn probability_partial_terms() {
        let latest = LatestReadings {
            ema50: Some(90.0),
            ema200: Some(100.0),
            rsi14: Some(40.0),
            macd_histogram: Some(-0.2),
            adx: Some(30.0),
            ..readings()
        };
        let p = pattern_probability(&latest, None, false, &Thresholds::default());
        // 20 + 15*0.5 + 25 + 15*0.5
        assert_relative_eq!(p.bearish, 60.0, epsilon = 1e-9);
        assert_relative_eq!(p.bullish, 0.0);
    }

    fn spike_series(last_close: f64, last_volume: f64) -> TimeSeries {
        let mut bars = wavy_bars(120);
        let prev = bars[118].close;
        let last = &mut bars[119];
        last.close = last_close;
        last.high = last.close.max(prev) + 1.0;
        last.low = last.close.min(prev) - 1.0;
        last.volume = last_volume;
        TimeSeries::new("SPIKE", bars)
    }

    #[test]
    fn abrupt_move_and_high_volume() {
        let base = wavy_bars(120);
        let series = spike_series(base[118].close * 1.12, 200_000.0);
        let set = compute(&series).unwrap();
        let alerts = AnomalyDetector::new(Thresholds::default()).detect("SPIKE", &series, &set, None);
        let abrupt = alerts
            .iter()
            .find(|a| a.subtype == AlertSubtype::CambioPrecioAbrupto)
            .unwrap();
        assert_eq!(abrupt.severity, Severity::Alta);
        assert_eq!(abrupt.kind, AlertKind::Anomaly);
        assert!(alerts.iter().any(|a| a.subtype == AlertSubtype::VolumenAlto));
    }

    #[test]
    fn low_volume_is_flagged() {
        let base = wavy_bars(120);
        let series = spike_series(base[119].close, 100.0);
        let set = compute(&series).unwrap();
        let alerts = AnomalyDetector::new(Thresholds::default()).detect("SPIKE", &series, &set, None);
        let low = alerts.iter().find(|a| a.subtype == AlertSubtype::VolumenBajo).unwrap();
        assert_eq!(low.severity, Severity::Baja);
    }

    #[test]
    fn volatility_expansion_is_relative_to_history() {
        let mut bars = wavy_bars(120);
        for bar in bars.iter_mut().skip(110) {
            bar.high = bar.close + 12.0;
            bar.low = bar.close - 12.0;
        }
        let series = TimeSeries::new("VOL", bars);
        let set = compute(&series).unwrap();
        let alerts = AnomalyDetector::new(Thresholds::default()).detect("VOL", &series, &set, None);
        assert!(alerts.iter().any(|a| a.subtype == AlertSubtype::VolatilidadAumentada));

        let calm = TimeSeries::new("CALM", wavy_bars(120));
        let set = compute(&calm).unwrap();
        let alerts = AnomalyDetector::new(Thresholds::default()).detect("CALM", &calm, &set, None);
        assert!(!alerts.iter().any(|a| a.subtype == AlertSubtype::VolatilidadAumentada));
    }

    fn bars_from(closes: &[f64]) -> Vec<OhlcvBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| OhlcvBar {
                timestamp: day(i),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn broken_correlation_against_reference() {
        let reference: Vec<f64> = (0..80).map(|i| 100.0 + (i as f64 * 0.9).sin() * 3.0).collect();
        let mut follower = reference.clone();
        // decouple the last ten bars: mirror the reference's moves
        for i in 70..80 {
            follower[i] = follower[i - 1] - (reference[i] - reference[i - 1]);
        }
        let a = TimeSeries::new("ETH-USD", bars_from(&follower));
        let b = TimeSeries::new("BTC-USD", bars_from(&reference));
        let rolling = rolling_return_correlation(&a, &b, CORRELATION_WINDOW);
        assert!(rolling[0] > 0.99);

        let set = compute(&a).unwrap();
        let alerts = AnomalyDetector::new(Thresholds::default()).detect("ETH-USD", &a, &set, Some(&b));
        let broken = alerts.iter().find(|a| a.subtype == AlertSubtype::CorrelacionRota).unwrap();
        assert!(broken.message.contains("BTC-USD"));
    }

    #[test]
    fn correlation_needs_shared_timestamps() {
        let a = TimeSeries::new("A", bars_from(&[1.0, 2.0, 3.0]));
        let mut shifted = bars_from(&[1.0, 2.0, 3.0]);
        for (i, bar) in shifted.iter_mut().enumerate() {
            bar.timestamp = day(100 + i);
        }
        let b = TimeSeries::new("B", shifted);
        assert!(rolling_return_correlation(&a, &b, 2).is_empty());
    }

    #[test]
    fn divergence_detection() {
        let lows = [10.0, 9.0, 9.5, 8.0].map(Some);
        let highs = [12.0, 11.0, 11.5, 10.0].map(Some);
        let osc_rising_lows = [30.0, 25.0, 35.0, 28.0].map(Some);
        assert_eq!(divergence(&lows, &highs, &osc_rising_lows), Some(Divergence::Bullish));

        let lows = [10.0, 10.0, 10.0, 10.0].map(Some);
        let highs = [12.0, 13.0, 12.5, 14.0].map(Some);
        let osc_falling_highs = [70.0, 75.0, 72.0, 71.0].map(Some);
        assert_eq!(divergence(&lows, &highs, &osc_falling_highs), Some(Divergence::Bearish));

        let gaps = [None, Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(divergence(&lows, &highs, &gaps), None);
    }

    #[test]
    fn subtype_kinds() {
        assert_eq!(AlertSubtype::PatronAlcista.kind(), AlertKind::Opportunity);
        assert_eq!(AlertSubtype::DivergenciaBajistaMacd.kind(), AlertKind::Opportunity);
        assert_eq!(AlertSubtype::CorrelacionRota.kind(), AlertKind::Anomaly);
        assert_eq!(AlertSubtype::VolumenBajo.to_string(), "VOLUMEN_BAJO");
    }
}
