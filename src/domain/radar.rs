//! Regime-gated tactical screening.
//!
//! Only the radars matching the benchmark regime are evaluated:
//!
//! | Regime  | Radars                                        |
//! |---------|-----------------------------------------------|
//! | ALCISTA | 1 mean reversion, 2 momentum ignition         |
//! | BAJISTA | 3 bearish reversion, 4 bearish breakout       |
//! | LATERAL | 5 range trading                               |
//!
//! A ticker matching several active radars is reported once, under the
//! lowest-numbered one.

use crate::domain::acquisition::BatchPriceCache;
use crate::domain::indicator::macd::histogram_at;
use crate::domain::indicator::{IndicatorSet, compute};
use crate::domain::ohlcv::TimeSeries;
use crate::domain::regime::{Regime, RegimeState};
use crate::domain::thresholds::Thresholds;
use crate::domain::universe::Universe;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Bars inspected for price/EMA20 crossings.
pub const CROSSING_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub enum RadarId {
    MeanReversion,
    MomentumIgnition,
    BearishReversion,
    BearishBreakout,
    RangeTrading,
}

impl RadarId {
    pub fn number(self) -> u8 {
        match self {
            RadarId::MeanReversion => 1,
            RadarId::MomentumIgnition => 2,
            RadarId::BearishReversion => 3,
            RadarId::BearishBreakout => 4,
            RadarId::RangeTrading => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RadarId::MeanReversion => "mean-reversion",
            RadarId::MomentumIgnition => "momentum-ignition",
            RadarId::BearishReversion => "bearish-reversion",
            RadarId::BearishBreakout => "bearish-breakout",
            RadarId::RangeTrading => "range-trading",
        }
    }

    /// Radars evaluated under `regime`, in priority order.
    pub fn active_for(regime: Regime) -> &'static [RadarId] {
        match regime {
            Regime::Alcista => &[RadarId::MeanReversion, RadarId::MomentumIgnition],
            Regime::Bajista => &[RadarId::BearishReversion, RadarId::BearishBreakout],
            Regime::Lateral => &[RadarId::RangeTrading],
        }
    }
}

impl From<RadarId> for u8 {
    fn from(id: RadarId) -> u8 {
        id.number()
    }
}

impl fmt::Display for RadarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "radar-{} ({})", self.number(), self.name())
    }
}

/// Latest readings a radar decision is taken on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadarSnapshot {
    pub price: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub ema100: f64,
    pub rsi: f64,
    pub adx: f64,
    pub macd_hist: f64,
    pub macd_hist_prev: f64,
    pub ema20_crossings: usize,
    pub crossed_last_bar: bool,
}

fn crossed(prev_close: f64, prev_ema: f64, close: f64, ema: f64) -> bool {
    (close > ema && prev_close <= prev_ema) || (close < ema && prev_close >= prev_ema)
}

impl RadarSnapshot {
    /// `None` until every reading is past warm-up, including the previous
    /// MACD histogram.
    pub fn from_indicators(series: &TimeSeries, set: &IndicatorSet) -> Option<Self> {
        let n = series.len();
        if n < 2 {
            return None;
        }
        let latest = set.latest();
        let crossing_at = |i: usize| -> Option<bool> {
            let (prev_ema, ema) = (set.ema20.simple_at(i - 1)?, set.ema20.simple_at(i)?);
            Some(crossed(series.bars[i - 1].close, prev_ema, series.bars[i].close, ema))
        };
        let start = n.saturating_sub(CROSSING_WINDOW).max(1);
        let ema20_crossings = (start..n).filter(|&i| crossing_at(i) == Some(true)).count();

        Some(RadarSnapshot {
            price: series.bars[n - 1].close,
            ema20: latest.ema20?,
            ema50: latest.ema50?,
            ema100: latest.ema100?,
            rsi: latest.rsi14?,
            adx: latest.adx?,
            macd_hist: histogram_at(&set.macd, n - 1)?,
            macd_hist_prev: histogram_at(&set.macd, n - 2)?,
            ema20_crossings,
            crossed_last_bar: crossing_at(n - 1) == Some(true),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarCandidate {
    pub ticker: String,
    pub radar_id: RadarId,
    pub snapshot: RadarSnapshot,
    pub score: f64,
}

fn matches(id: RadarId, s: &RadarSnapshot, t: &Thresholds) -> bool {
    match id {
        RadarId::MeanReversion => s.price > s.ema100 && s.price < s.ema50 && s.rsi < t.radar1_rsi_max,
        RadarId::MomentumIgnition => {
            s.macd_hist_prev <= 0.0 && s.macd_hist > 0.0 && s.adx > t.adx_trend && s.rsi > t.radar2_rsi_min
        }
        RadarId::BearishReversion => s.price < s.ema100 && s.price > s.ema50 && s.rsi > t.radar3_rsi_min,
        RadarId::BearishBreakout => {
            s.macd_hist_prev >= 0.0 && s.macd_hist < 0.0 && s.adx > t.adx_trend && s.rsi < t.radar4_rsi_max
        }
        RadarId::RangeTrading => {
            s.adx < t.adx_trend
                && s.rsi >= t.radar5_rsi_low
                && s.rsi <= t.radar5_rsi_high
                && s.ema20_crossings >= t.radar5_min_crossovers
        }
    }
}

pub fn score(id: RadarId, s: &RadarSnapshot, t: &Thresholds) -> f64 {
    match id {
        RadarId::MeanReversion => {
            let discount = (s.ema100 - s.price) / s.price * 100.0;
            50.0 + (t.radar1_rsi_max - s.rsi) + 2.0 * discount
        }
        RadarId::MomentumIgnition => 60.0 + 1.5 * (s.adx - t.adx_trend) + 0.5 * (s.rsi - t.radar2_rsi_min),
        RadarId::BearishReversion => {
            let premium = (s.price - s.ema100) / s.price * 100.0;
            50.0 + (s.rsi - t.radar3_rsi_min) + 2.0 * premium
        }
        RadarId::BearishBreakout => 60.0 + 1.5 * (s.adx - t.adx_trend) + 0.5 * (t.radar4_rsi_max - s.rsi),
        RadarId::RangeTrading => {
            let bonus = if s.crossed_last_bar { 10.0 } else { 0.0 };
            40.0 + 2.0 * (t.adx_trend - s.adx) - 0.5 * (50.0 - s.rsi).abs() + bonus
        }
    }
}

/// First active radar matching `snapshot`, scored.
pub fn evaluate(
    ticker: &str,
    snapshot: &RadarSnapshot,
    regime: Regime,
    thresholds: &Thresholds,
) -> Option<RadarCandidate> {
    RadarId::active_for(regime)
        .iter()
        .copied()
        .find(|&id| matches(id, snapshot, thresholds))
        .map(|radar_id| RadarCandidate {
            ticker: ticker.to_string(),
            radar_id,
            snapshot: *snapshot,
            score: score(radar_id, snapshot, thresholds),
        })
}

fn ranking(a: &RadarCandidate, b: &RadarCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.snapshot.adx.total_cmp(&a.snapshot.adx))
        .then_with(|| {
            let da = (a.snapshot.rsi - 50.0).abs();
            let db = (b.snapshot.rsi - 50.0).abs();
            db.total_cmp(&da)
        })
        .then_with(|| a.ticker.cmp(&b.ticker))
}

/// Sort by score, ADX, RSI distance from 50 (all descending) then ticker,
/// and keep the first `max`.
pub fn rank(mut candidates: Vec<RadarCandidate>, max: usize) -> Vec<RadarCandidate> {
    candidates.sort_by(ranking);
    candidates.truncate(max);
    candidates
}

pub struct TacticalRadarBank {
    thresholds: Thresholds,
    max_candidates: usize,
}

impl TacticalRadarBank {
    pub fn new(thresholds: Thresholds, max_candidates: usize) -> Self {
        Self {
            thresholds,
            max_candidates,
        }
    }

    /// Screen precomputed snapshots.
    pub fn screen<'a>(
        &self,
        snapshots: impl IntoIterator<Item = (&'a str, &'a RadarSnapshot)>,
        regime: &RegimeState,
    ) -> Vec<RadarCandidate> {
        let candidates = snapshots
            .into_iter()
            .filter_map(|(ticker, s)| evaluate(ticker, s, regime.regime, &self.thresholds))
            .collect();
        let ranked = rank(candidates, self.max_candidates);
        tracing::info!(
            regime = %regime.regime,
            candidates = ranked.len(),
            "radar screening complete"
        );
        ranked
    }

    /// Screen every universe ticker present in the batch cache. Tickers that
    /// are missing or too short to warm up are skipped.
    pub fn run(
        &self,
        universe: &Universe,
        cache: &BatchPriceCache,
        regime: &RegimeState,
    ) -> Vec<RadarCandidate> {
        let mut snapshots = Vec::new();
        for ticker in &universe.tickers {
            let Some(series) = cache.get(ticker) else {
                continue;
            };
            match compute(&series) {
                Ok(set) => {
                    if let Some(s) = RadarSnapshot::from_indicators(&series, &set) {
                        snapshots.push((ticker.clone(), s));
                    }
                }
                Err(e) => tracing::debug!(ticker = %ticker, error = %e, "radar skipped ticker"),
            }
        }
        self.screen(snapshots.iter().map(|(t, s)| (t.as_str(), s)), regime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::testing::wavy_bars;
    use crate::domain::regime::RegimeReadings;
    use crate::domain::universe::AssetClass;
    use approx::assert_relative_eq;

    fn snap() -> RadarSnapshot {
        RadarSnapshot {
            price: 100.0,
            ema20: 100.0,
            ema50: 100.0,
            ema100: 100.0,
            rsi: 50.0,
            adx: 25.0,
            macd_hist: 0.0,
            macd_hist_prev: 0.0,
            ema20_crossings: 0,
            crossed_last_bar: false,
        }
    }

    fn state(regime: Regime) -> RegimeState {
        RegimeState {
            benchmark: "SPY".into(),
            regime,
            confidence: 60.0,
            readings: RegimeReadings {
                close: 1.0,
                ema50: 1.0,
                ema100: 1.0,
                rsi: 50.0,
                adx: 25.0,
            },
        }
    }

    #[test]
    fn momentum_ignition_fires_under_bull_regime() {
        let s = RadarSnapshot {
            macd_hist_prev: -0.1,
            macd_hist: 0.05,
            adx: 22.0,
            rsi: 55.0,
            ..snap()
        };
        let c = evaluate("NVDA", &s, Regime::Alcista, &Thresholds::default()).unwrap();
        assert_eq!(c.radar_id, RadarId::MomentumIgnition);
        assert_relative_eq!(c.score, 60.0 + 3.0 + 2.5);
    }

    #[test]
    fn bull_radars_are_inactive_in_bear_regime() {
        let s = RadarSnapshot {
            macd_hist_prev: -0.1,
            macd_hist: 0.05,
            adx: 22.0,
            rsi: 55.0,
            ..snap()
        };
        assert!(evaluate("NVDA", &s, Regime::Bajista, &Thresholds::default()).is_none());
        assert!(evaluate("NVDA", &s, Regime::Lateral, &Thresholds::default()).is_none());
    }

    #[test]
    fn first_matching_radar_tags_the_ticker() {
        // pullback that also ignites momentum
        let s = RadarSnapshot {
            price: 100.0,
            ema50: 105.0,
            ema100: 95.0,
            rsi: 35.0,
            macd_hist_prev: -0.1,
            macd_hist: 0.1,
            adx: 30.0,
            ..snap()
        };
        let t = Thresholds {
            radar2_rsi_min: 30.0,
            ..Thresholds::default()
        };
        let c = evaluate("AAPL", &s, Regime::Alcista, &t).unwrap();
        assert_eq!(c.radar_id, RadarId::MeanReversion);
    }

    #[test]
    fn bearish_radars() {
        let t = Thresholds::default();
        let rebound = RadarSnapshot {
            price: 100.0,
            ema50: 95.0,
            ema100: 110.0,
            rsi: 65.0,
            ..snap()
        };
        assert_eq!(
            evaluate("X", &rebound, Regime::Bajista, &t).unwrap().radar_id,
            RadarId::BearishReversion
        );
        let breakdown = RadarSnapshot {
            macd_hist_prev: 0.2,
            macd_hist: -0.1,
            adx: 28.0,
            rsi: 42.0,
            ..snap()
        };
        let c = evaluate("Y", &breakdown, Regime::Bajista, &t).unwrap();
        assert_eq!(c.radar_id, RadarId::BearishBreakout);
        assert_relative_eq!(c.score, 60.0 + 12.0 + 4.0);
    }

    #[test]
    fn range_trading_needs_crossings() {
        let t = Thresholds::default();
        let quiet = RadarSnapshot {
            adx: 15.0,
            rsi: 48.0,
            ema20_crossings: 1,
            ..snap()
        };
        assert!(evaluate("Z", &quiet, Regime::Lateral, &t).is_none());
        let choppy = RadarSnapshot {
            ema20_crossings: 3,
            crossed_last_bar: true,
            ..quiet
        };
        let c = evaluate("Z", &choppy, Regime::Lateral, &t).unwrap();
        assert_relative_eq!(c.score, 40.0 + 10.0 - 1.0 + 10.0);
    }

    #[test]
    fn ranking_breaks_ties() {
        let make = |ticker: &str, score: f64, adx: f64, rsi: f64| RadarCandidate {
            ticker: ticker.into(),
            radar_id: RadarId::RangeTrading,
            snapshot: RadarSnapshot { adx, rsi, ..snap() },
            score,
        };
        let ranked = rank(
            vec![
                make("D", 50.0, 10.0, 50.0),
                make("C", 50.0, 10.0, 60.0),
                make("B", 50.0, 15.0, 50.0),
                make("A", 70.0, 5.0, 50.0),
                make("E", 50.0, 10.0, 50.0),
            ],
            4,
        );
        let order: Vec<_> = ranked.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(order, ["A", "B", "C", "D"]);
    }

    #[test]
    fn snapshot_requires_warmup() {
        let short = TimeSeries::new("S", wavy_bars(60));
        let set = compute(&short).unwrap();
        assert!(RadarSnapshot::from_indicators(&short, &set).is_none());

        let long = TimeSeries::new("L", wavy_bars(150));
        let set = compute(&long).unwrap();
        let s = RadarSnapshot::from_indicators(&long, &set).unwrap();
        assert!(s.ema20_crossings <= CROSSING_WINDOW);
    }

    #[test]
    fn run_skips_missing_tickers() {
        let cache: BatchPriceCache = [TimeSeries::new("AAA", wavy_bars(150))].into_iter().collect();
        let universe = Universe::new(vec!["AAA".into(), "BBB".into()], AssetClass::Equity);
        let bank = TacticalRadarBank::new(Thresholds::default(), 10);
        let out = bank.run(&universe, &cache, &state(Regime::Lateral));
        assert!(out.iter().all(|c| c.ticker == "AAA"));
    }

    #[test]
    fn radar_id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&RadarId::RangeTrading).unwrap(), "5");
    }
}
