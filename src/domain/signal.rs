//! Per-instrument signal generation.
//!
//! Evaluation runs in two passes. The accumulation pass appends the alert
//! tags of every matching rule, in rule order, and collects candidate
//! recommendations. The selection pass picks the first candidate in priority
//! order. Counter-trend and counter-regime annotations are appended after
//! selection; nothing already in the alert log is ever removed or reordered.

use crate::domain::indicator::macd::histogram_at;
use crate::domain::indicator::{IndicatorSet, IndicatorValue};
use crate::domain::ohlcv::TimeSeries;
use crate::domain::regime::{Regime, RegimeState};
use crate::domain::thresholds::Thresholds;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Comprar,
    Vender,
    Mantener,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::Comprar => "COMPRAR",
            Recommendation::Vender => "VENDER",
            Recommendation::Mantener => "MANTENER",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertTag {
    RupturaAlcistaConfirmada,
    RupturaBajistaConfirmada,
    MacdCruceAlcista,
    MacdCruceBajista,
    MercadoLateral,
    Sobrecompra,
    Sobreventa,
    AlertaContraTendencia,
    AlertaContraRegimen,
    SinSenales,
}

impl AlertTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertTag::RupturaAlcistaConfirmada => "RUPTURA_ALCISTA_CONFIRMADA",
            AlertTag::RupturaBajistaConfirmada => "RUPTURA_BAJISTA_CONFIRMADA",
            AlertTag::MacdCruceAlcista => "MACD_CRUCE_ALCISTA",
            AlertTag::MacdCruceBajista => "MACD_CRUCE_BAJISTA",
            AlertTag::MercadoLateral => "MERCADO_LATERAL",
            AlertTag::Sobrecompra => "SOBRECOMPRA",
            AlertTag::Sobreventa => "SOBREVENTA",
            AlertTag::AlertaContraTendencia => "ALERTA_CONTRA_TENDENCIA",
            AlertTag::AlertaContraRegimen => "ALERTA_CONTRA_REGIMEN",
            AlertTag::SinSenales => "SIN_SEÑALES",
        }
    }
}

impl fmt::Display for AlertTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AlertTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Alert list that only supports appending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AlertLog(Vec<AlertTag>);

impl AlertLog {
    pub fn push(&mut self, tag: AlertTag) {
        self.0.push(tag);
    }

    pub fn as_slice(&self) -> &[AlertTag] {
        &self.0
    }

    pub fn contains(&self, tag: AlertTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub ticker: String,
    pub recommendation: Recommendation,
    pub priority: Priority,
    pub alerts: AlertLog,
    pub price: f64,
    pub rsi: Option<f64>,
    pub adx: Option<f64>,
    pub macd_histogram: Option<f64>,
}

/// Recommendation proposed by one rule during accumulation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    rank: u8,
    recommendation: Recommendation,
    priority: Priority,
}

struct Accumulation {
    alerts: AlertLog,
    candidates: Vec<Candidate>,
}

// lower rank wins in selection
const RANK_BREAKOUT: u8 = 0;
const RANK_LATERAL: u8 = 1;
const RANK_MACD: u8 = 2;

fn band_at(set: &IndicatorSet, index: usize) -> Option<(f64, f64)> {
    match set.bollinger.valid_at(index) {
        Some(IndicatorValue::Band { upper, lower, .. }) => Some((*upper, *lower)),
        _ => None,
    }
}

fn accumulate(series: &TimeSeries, set: &IndicatorSet, thresholds: &Thresholds) -> Accumulation {
    let mut alerts = AlertLog::default();
    let mut candidates = Vec::new();
    let n = series.len();
    let latest = set.latest();

    // 1. Bollinger breakout confirmed by volume
    if n >= 2 {
        let (cur, prev) = (&series.bars[n - 1], &series.bars[n - 2]);
        let volume_ok = latest
            .volume_sma20
            .is_some_and(|avg| cur.volume > thresholds.breakout_volume * avg);
        if let (Some((upper, lower)), Some((prev_upper, prev_lower))) =
            (band_at(set, n - 1), band_at(set, n - 2))
        {
            if volume_ok && cur.close > upper && prev.close <= prev_upper {
                alerts.push(AlertTag::RupturaAlcistaConfirmada);
                candidates.push(Candidate {
                    rank: RANK_BREAKOUT,
                    recommendation: Recommendation::Comprar,
                    priority: Priority::High,
                });
            } else if volume_ok && cur.close < lower && prev.close >= prev_lower {
                alerts.push(AlertTag::RupturaBajistaConfirmada);
                candidates.push(Candidate {
                    rank: RANK_BREAKOUT,
                    recommendation: Recommendation::Vender,
                    priority: Priority::High,
                });
            }
        }
    }

    // 2. MACD histogram zero-cross
    if n >= 2 {
        if let (Some(cur), Some(prev)) = (histogram_at(&set.macd, n - 1), histogram_at(&set.macd, n - 2)) {
            if prev <= 0.0 && cur > 0.0 {
                alerts.push(AlertTag::MacdCruceAlcista);
                candidates.push(Candidate {
                    rank: RANK_MACD,
                    recommendation: Recommendation::Comprar,
                    priority: Priority::Medium,
                });
            } else if prev >= 0.0 && cur < 0.0 {
                alerts.push(AlertTag::MacdCruceBajista);
                candidates.push(Candidate {
                    rank: RANK_MACD,
                    recommendation: Recommendation::Vender,
                    priority: Priority::Medium,
                });
            }
        }
    }

    // 3. Range-bound market
    if let Some(adx) = latest.adx {
        if adx < thresholds.adx_trend {
            alerts.push(AlertTag::MercadoLateral);
            let (recommendation, priority) = match latest.rsi14 {
                Some(rsi) if rsi < thresholds.rsi_oversold => (Recommendation::Comprar, Priority::Medium),
                Some(rsi) if rsi > thresholds.rsi_overbought => (Recommendation::Vender, Priority::Medium),
                _ => (Recommendation::Mantener, Priority::Low),
            };
            candidates.push(Candidate {
                rank: RANK_LATERAL,
                recommendation,
                priority,
            });
        }
    }

    // 4. RSI zone
    if let Some(rsi) = latest.rsi14 {
        if rsi > thresholds.rsi_overbought {
            alerts.push(AlertTag::Sobrecompra);
        } else if rsi < thresholds.rsi_oversold {
            alerts.push(AlertTag::Sobreventa);
        }
    }

    Accumulation { alerts, candidates }
}

fn select(candidates: &[Candidate]) -> (Recommendation, Priority) {
    candidates
        .iter()
        .min_by_key(|c| c.rank)
        .map(|c| (c.recommendation, c.priority))
        .unwrap_or((Recommendation::Mantener, Priority::Low))
}

/// Evaluate the rule cascade for one instrument.
pub fn generate(
    ticker: &str,
    series: &TimeSeries,
    set: &IndicatorSet,
    regime: &RegimeState,
    thresholds: &Thresholds,
) -> Signal {
    let Accumulation {
        mut alerts,
        candidates,
    } = accumulate(series, set, thresholds);
    let (recommendation, priority) = select(&candidates);
    let latest = set.latest();

    if let (Some(ema50), Some(ema200)) = (latest.ema50, latest.ema200) {
        let against_trend = match recommendation {
            Recommendation::Comprar => ema50 < ema200,
            Recommendation::Vender => ema50 > ema200,
            Recommendation::Mantener => false,
        };
        if against_trend {
            alerts.push(AlertTag::AlertaContraTendencia);
        }
    }

    let against_regime = matches!(
        (recommendation, regime.regime),
        (Recommendation::Comprar, Regime::Bajista) | (Recommendation::Vender, Regime::Alcista)
    );
    if against_regime {
        alerts.push(AlertTag::AlertaContraRegimen);
    }

    if alerts.is_empty() {
        alerts.push(AlertTag::SinSenales);
    }

    Signal {
        ticker: ticker.to_string(),
        recommendation,
        priority,
        alerts,
        price: series.last().map(|b| b.close).unwrap_or(0.0),
        rsi: latest.rsi14,
        adx: latest.adx,
        macd_histogram: latest.macd_histogram,
    }
}
