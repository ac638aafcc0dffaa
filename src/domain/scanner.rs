//! Multi-instrument market scan with a 0-100 multi-factor score.
//!
//! Metrics come from the per-cycle batch cache; tickers shorter than
//! [`SCAN_MIN_BARS`] are not scanned. A strategy filter selects candidates,
//! which are then scored and ranked by total descending, ticker ascending.

use crate::domain::acquisition::BatchPriceCache;
use crate::domain::error::RadarError;
use crate::domain::indicator::atr::atr_percent;
use crate::domain::indicator::{IndicatorSet, compute};
use crate::domain::ohlcv::TimeSeries;
use crate::domain::universe::{AssetClass, Universe};
use crate::ports::sentiment_port::SentimentSource;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub const SCAN_MIN_BARS: usize = 50;
const BREAKOUT_LOOKBACK: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStrategy {
    Momentum,
    Breakout,
    GoldenCross,
    Value,
    Mixed,
}

impl ScanStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStrategy::Momentum => "momentum",
            ScanStrategy::Breakout => "breakout",
            ScanStrategy::GoldenCross => "golden_cross",
            ScanStrategy::Value => "value",
            ScanStrategy::Mixed => "mixed",
        }
    }

    /// Strategy filter over one ticker's metrics.
    pub fn accepts(&self, m: &ScanMetrics) -> bool {
        match self {
            ScanStrategy::Momentum => m.above_sma50 && (m.roc10 > 3.0 || m.rvol > 1.5),
            ScanStrategy::Breakout => (m.breakout_up || m.change_pct > 3.0) && m.rvol > 1.2,
            ScanStrategy::GoldenCross => m.golden_cross && m.rvol > 1.0,
            ScanStrategy::Value => {
                (!m.above_sma50 && m.roc10 > -5.0 && m.roc10 < 3.0)
                    || (m.above_sma50 && m.roc10 > 0.0 && m.rvol > 1.3)
            }
            ScanStrategy::Mixed => {
                (m.above_sma50 && m.rvol > 1.2)
                    || m.breakout_up
                    || m.golden_cross
                    || (m.roc10 > 5.0 && m.rvol > 1.0)
                    || m.change_pct > 3.0
            }
        }
    }
}

impl FromStr for ScanStrategy {
    type Err = RadarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "momentum" => Ok(ScanStrategy::Momentum),
            "breakout" => Ok(ScanStrategy::Breakout),
            "golden_cross" => Ok(ScanStrategy::GoldenCross),
            "value" => Ok(ScanStrategy::Value),
            "mixed" => Ok(ScanStrategy::Mixed),
            _ => Err(RadarError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for ScanStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanMetrics {
    pub ticker: String,
    pub price: f64,
    pub change_pct: f64,
    pub rvol: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub sma200: Option<f64>,
    pub above_sma50: bool,
    pub above_sma200: bool,
    pub golden_cross: bool,
    pub death_cross: bool,
    pub breakout_up: bool,
    pub breakout_down: bool,
    pub roc10: f64,
    pub atr_pct: f64,
}

impl ScanMetrics {
    /// `None` below [`SCAN_MIN_BARS`] or while a required reading is still
    /// warming up. SMA200 is optional; without it the ticker is never above
    /// SMA200 and never crosses.
    pub fn from_indicators(series: &TimeSeries, set: &IndicatorSet) -> Option<Self> {
        let n = series.len();
        if n < SCAN_MIN_BARS {
            return None;
        }
        let bars = &series.bars;
        let last = &bars[n - 1];
        let prev_close = bars[n - 2].close;
        let latest = set.latest();

        let sma50 = latest.sma50?;
        let sma200 = latest.sma200;
        let cross = match (sma200, set.sma50.simple_at(n - 2), set.sma200.simple_at(n - 2)) {
            (Some(long), Some(prev_short), Some(prev_long)) => {
                if sma50 > long && prev_short <= prev_long {
                    1
                } else if sma50 < long && prev_short >= prev_long {
                    -1
                } else {
                    0
                }
            }
            _ => 0,
        };

        let prior = &bars[n - 1 - BREAKOUT_LOOKBACK..n - 1];
        let prior_high = prior.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let prior_low = prior.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);

        let rvol = match latest.volume_sma20 {
            Some(avg) if avg > 0.0 => last.volume / avg,
            _ => 0.0,
        };
        let atr_pct = atr_percent(bars, &set.atr14)
            .last()
            .copied()
            .flatten()
            .unwrap_or(0.0);

        Some(ScanMetrics {
            ticker: series.ticker.clone(),
            price: last.close,
            change_pct: if prev_close != 0.0 {
                (last.close - prev_close) / prev_close * 100.0
            } else {
                0.0
            },
            rvol,
            sma20: latest.sma20?,
            sma50,
            sma200,
            above_sma50: last.close > sma50,
            above_sma200: sma200.is_some_and(|v| last.close > v),
            golden_cross: cross == 1,
            death_cross: cross == -1,
            breakout_up: last.close > prior_high,
            breakout_down: last.close < prior_low,
            roc10: latest.roc10?,
            atr_pct,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLabel {
    Baja,
    Media,
    Alta,
}

impl ConfidenceLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            ConfidenceLabel::Alta
        } else if score >= 50.0 {
            ConfidenceLabel::Media
        } else {
            ConfidenceLabel::Baja
        }
    }
}

impl fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfidenceLabel::Baja => "BAJA",
            ConfidenceLabel::Media => "MEDIA",
            ConfidenceLabel::Alta => "ALTA",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub momentum: f64,
    pub volume: f64,
    pub trend: f64,
    pub special_signals: f64,
    pub sentiment_adjustment: f64,
    pub total: f64,
    pub confidence: ConfidenceLabel,
}

impl ScoreBreakdown {
    pub fn score(m: &ScanMetrics, sentiment_adjustment: f64) -> Self {
        let momentum = (0.7 * m.roc10).clamp(0.0, 25.0);
        let volume = 3.0 * (m.rvol - 1.0).clamp(0.0, 5.0);
        let trend = 10.0 * (u8::from(m.above_sma50) + u8::from(m.above_sma200)) as f64;
        let special_signals = 15.0 * (u8::from(m.breakout_up) + u8::from(m.golden_cross)) as f64;
        let total = (momentum + volume + trend + special_signals + sentiment_adjustment).clamp(0.0, 100.0);
        ScoreBreakdown {
            momentum,
            volume,
            trend,
            special_signals,
            sentiment_adjustment,
            total,
            confidence: ConfidenceLabel::from_score(total),
        }
    }
}

/// Flat contrarian lookup on a [0, 100] sentiment reading.
pub fn sentiment_adjustment(reading: Option<f64>) -> f64 {
    match reading {
        Some(v) if v < 25.0 => 10.0,
        Some(v) if v < 40.0 => 5.0,
        Some(v) if v > 75.0 => -10.0,
        Some(v) if v > 60.0 => -5.0,
        _ => 0.0,
    }
}

/// Sentiment reading for `asset_class`, or `None` when the source fails or
/// returns a value outside [0, 100].
pub async fn fetch_sentiment(source: &dyn SentimentSource, asset_class: AssetClass) -> Option<f64> {
    match source.sentiment(asset_class).await {
        Ok(v) if (0.0..=100.0).contains(&v) => Some(v),
        Ok(v) => {
            tracing::warn!(asset_class = %asset_class, value = v, "sentiment out of range, ignored");
            None
        }
        Err(e) => {
            tracing::warn!(asset_class = %asset_class, error = %e, "sentiment unavailable");
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanCandidate {
    pub ticker: String,
    pub metrics: ScanMetrics,
    pub breakdown: ScoreBreakdown,
}

fn ranking(a: &ScanCandidate, b: &ScanCandidate) -> Ordering {
    b.breakdown
        .total
        .total_cmp(&a.breakdown.total)
        .then_with(|| a.ticker.cmp(&b.ticker))
}

/// Filter, score and rank. The output does not depend on input order.
pub fn rank_metrics(
    metrics: impl IntoIterator<Item = ScanMetrics>,
    strategy: ScanStrategy,
    sentiment_adjustment: f64,
    max_candidates: usize,
) -> Vec<ScanCandidate> {
    let mut candidates: Vec<ScanCandidate> = metrics
        .into_iter()
        .filter(|m| strategy.accepts(m))
        .map(|m| ScanCandidate {
            ticker: m.ticker.clone(),
            breakdown: ScoreBreakdown::score(&m, sentiment_adjustment),
            metrics: m,
        })
        .collect();
    candidates.sort_by(ranking);
    candidates.truncate(max_candidates);
    candidates
}

pub struct MarketScanner {
    strategy: ScanStrategy,
    max_candidates: usize,
}

impl MarketScanner {
    pub fn new(strategy: ScanStrategy, max_candidates: usize) -> Self {
        Self {
            strategy,
            max_candidates,
        }
    }

    pub fn strategy(&self) -> ScanStrategy {
        self.strategy
    }

    pub fn rank(&self, metrics: impl IntoIterator<Item = ScanMetrics>, sentiment: Option<f64>) -> Vec<ScanCandidate> {
        let adjustment = sentiment_adjustment(sentiment);
        let ranked = rank_metrics(metrics, self.strategy, adjustment, self.max_candidates);
        tracing::info!(
            strategy = %self.strategy,
            sentiment_adjustment = adjustment,
            candidates = ranked.len(),
            "market scan complete"
        );
        ranked
    }

    /// Scan every universe ticker present in the batch cache.
    pub fn scan(&self, universe: &Universe, cache: &BatchPriceCache, sentiment: Option<f64>) -> Vec<ScanCandidate> {
        let metrics: Vec<ScanMetrics> = universe
            .tickers
            .iter()
            .filter_map(|ticker| cache.get(ticker))
            .filter(|series| series.len() >= SCAN_MIN_BARS)
            .filter_map(|series| match compute(&series) {
                Ok(set) => ScanMetrics::from_indicators(&series, &set),
                Err(e) => {
                    tracing::debug!(ticker = %series.ticker, error = %e, "scan skipped ticker");
                    None
                }
            })
            .collect();
        self.rank(metrics, sentiment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::testing::wavy_bars;
    use approx::assert_relative_eq;

    fn metrics(ticker: &str) -> ScanMetrics {
        ScanMetrics {
            ticker: ticker.into(),
            price: 100.0,
            change_pct: 0.0,
            rvol: 1.0,
            sma20: 100.0,
            sma50: 100.0,
            sma200: Some(100.0),
            above_sma50: false,
            above_sma200: false,
            golden_cross: false,
            death_cross: false,
            breakout_up: false,
            breakout_down: false,
            roc10: 0.0,
            atr_pct: 2.0,
        }
    }

    #[test]
    fn unknown_strategy_is_a_config_error() {
        let err = "contrarian".parse::<ScanStrategy>().unwrap_err();
        assert!(matches!(err, RadarError::UnknownStrategy(ref s) if s == "contrarian"));
        assert_eq!("Golden_Cross".parse::<ScanStrategy>().unwrap(), ScanStrategy::GoldenCross);
    }

    #[test]
    fn score_components_are_capped() {
        let m = ScanMetrics {
            roc10: 50.0,
            rvol: 9.0,
            above_sma50: true,
            above_sma200: true,
            breakout_up: true,
            golden_cross: true,
            ..metrics("A")
        };
        let b = ScoreBreakdown::score(&m, 10.0);
        assert_relative_eq!(b.momentum, 25.0);
        assert_relative_eq!(b.volume, 15.0);
        assert_relative_eq!(b.trend, 20.0);
        assert_relative_eq!(b.special_signals, 30.0);
        assert_relative_eq!(b.total, 100.0);
        assert_eq!(b.confidence, ConfidenceLabel::Alta);
    }

    #[test]
    fn negative_momentum_floors_at_zero() {
        let m = ScanMetrics {
            roc10: -8.0,
            ..metrics("A")
        };
        let b = ScoreBreakdown::score(&m, -10.0);
        assert_relative_eq!(b.momentum, 0.0);
        assert_relative_eq!(b.total, 0.0);
        assert_eq!(b.confidence, ConfidenceLabel::Baja);
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(ConfidenceLabel::from_score(49.9), ConfidenceLabel::Baja);
        assert_eq!(ConfidenceLabel::from_score(50.0), ConfidenceLabel::Media);
        assert_eq!(ConfidenceLabel::from_score(69.9), ConfidenceLabel::Media);
        assert_eq!(ConfidenceLabel::from_score(70.0), ConfidenceLabel::Alta);
    }

    #[test]
    fn sentiment_lookup() {
        assert_eq!(sentiment_adjustment(Some(10.0)), 10.0);
        assert_eq!(sentiment_adjustment(Some(30.0)), 5.0);
        assert_eq!(sentiment_adjustment(Some(50.0)), 0.0);
        assert_eq!(sentiment_adjustment(Some(65.0)), -5.0);
        assert_eq!(sentiment_adjustment(Some(90.0)), -10.0);
        assert_eq!(sentiment_adjustment(None), 0.0);
    }

    #[test]
    fn strategies_filter() {
        let trending = ScanMetrics {
            above_sma50: true,
            roc10: 4.0,
            ..metrics("T")
        };
        assert!(ScanStrategy::Momentum.accepts(&trending));
        assert!(!ScanStrategy::Breakout.accepts(&trending));
        assert!(!ScanStrategy::GoldenCross.accepts(&trending));

        let crossing = ScanMetrics {
            golden_cross: true,
            rvol: 1.1,
            ..metrics("G")
        };
        assert!(ScanStrategy::GoldenCross.accepts(&crossing));
        assert!(ScanStrategy::Mixed.accepts(&crossing));

        let dip = ScanMetrics {
            roc10: -2.0,
            ..metrics("V")
        };
        assert!(ScanStrategy::Value.accepts(&dip));
    }

    #[test]
    fn ties_rank_by_ticker() {
        let strong = |t: &str| ScanMetrics {
            above_sma50: true,
            rvol: 2.0,
            ..metrics(t)
        };
        let ranked = rank_metrics(
            vec![strong("MSFT"), strong("AAPL"), strong("GOOG")],
            ScanStrategy::Mixed,
            0.0,
            2,
        );
        let order: Vec<_> = ranked.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(order, ["AAPL", "GOOG"]);
    }

    #[test]
    fn short_series_are_not_scanned() {
        let series = TimeSeries::new("S", wavy_bars(40));
        let set = compute(&series).unwrap();
        assert!(ScanMetrics::from_indicators(&series, &set).is_none());

        let series = TimeSeries::new("L", wavy_bars(80));
        let set = compute(&series).unwrap();
        let m = ScanMetrics::from_indicators(&series, &set).unwrap();
        assert!(m.sma200.is_none());
        assert!(!m.above_sma200);
        assert!(m.atr_pct > 0.0);
    }
}
