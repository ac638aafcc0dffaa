//! Resilient bar-series acquisition.
//!
//! A fetch walks an ordered list of [`FetchStrategy`] descriptors. Each
//! strategy gets up to `max_attempts` tries with exponential backoff between
//! them; source errors are retried, validation failures skip straight to the
//! next strategy. The walk is an explicit state machine whose transitions are
//! recorded in an [`AcquisitionTrace`].

use crate::domain::error::RadarError;
use crate::domain::ohlcv::{RawBarTable, TimeSeries};
use crate::domain::validation::{self, DEFAULT_MAX_NAN_RATIO, ValidationReport};
use crate::ports::market_data_port::{MarketDataSource, SourceError};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_FALLBACK_PERIODS: [&str; 6] = ["5y", "2y", "1y", "6mo", "3mo", "1mo"];

const VALID_INTERVALS: [&str; 13] = [
    "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
];

/// Approximate calendar length of a lookback period such as `6mo` or `2y`.
/// `ytd` and `max` have no fixed length and return `None`.
pub fn period_days(period: &str) -> Option<i64> {
    let p = period.trim().to_lowercase();
    let split = p.find(|c: char| !c.is_ascii_digit())?;
    let (num, unit) = p.split_at(split);
    let n: i64 = num.parse().ok()?;
    if n == 0 {
        return None;
    }
    let days = match unit {
        "d" => n,
        "wk" => n * 7,
        "mo" => (n * 365) / 12,
        "y" => n * 365 + n / 4,
        _ => return None,
    };
    Some(days)
}

pub fn is_valid_period(period: &str) -> bool {
    matches!(period.trim(), "ytd" | "max") || period_days(period).is_some()
}

pub fn is_valid_interval(interval: &str) -> bool {
    VALID_INTERVALS.contains(&interval.trim())
}

/// Backoff applied before each retry within one strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed {
        delay: Duration,
    },
    /// `base * factor^(retry - 1)`, capped at `max`.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_secs(2),
            factor: 2.0,
            max: Duration::from_secs(60),
        }
    }
}

impl Backoff {
    /// Delay before the given 0-based attempt. The first attempt never waits.
    pub fn delay_before(self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential { base, factor, max } => {
                let scale = factor.powi(attempt as i32 - 1);
                let seconds = (base.as_secs_f64() * scale).min(max.as_secs_f64());
                Duration::from_secs_f64(seconds.max(0.0))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
            attempt_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionConfig {
    pub retry: RetryPolicy,
    pub fallback_periods: Vec<String>,
    pub max_nan_ratio: f64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            fallback_periods: DEFAULT_FALLBACK_PERIODS.iter().map(|p| p.to_string()).collect(),
            max_nan_ratio: DEFAULT_MAX_NAN_RATIO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchStrategy {
    pub period: String,
    pub interval: String,
}

impl FetchStrategy {
    pub fn new(period: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            interval: interval.into(),
        }
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.period, self.interval)
    }
}

/// Requested strategy first, then every ladder period strictly shorter than
/// the requested one, keeping the interval. Periods without a fixed length
/// (`max`, `ytd`) fall back through the whole ladder.
pub fn fallback_plan(period: &str, interval: &str, ladder: &[String]) -> Vec<FetchStrategy> {
    let mut plan = vec![FetchStrategy::new(period, interval)];
    let requested = period_days(period);
    for candidate in ladder {
        if candidate == period {
            continue;
        }
        let shorter = match (requested, period_days(candidate)) {
            (Some(req), Some(days)) => days < req,
            (None, Some(_)) => true,
            _ => false,
        };
        if shorter && !plan.iter().any(|s| &s.period == candidate) {
            plan.push(FetchStrategy::new(candidate.as_str(), interval));
        }
    }
    plan
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcquisitionState {
    Attempting { strategy: usize, attempt: u32 },
    BackingOff { strategy: usize, attempt: u32, delay_ms: u64 },
    Fallback { from: usize, to: usize },
    Exhausted,
    Succeeded { strategy: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEvent {
    #[serde(flatten)]
    pub state: AcquisitionState,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcquisitionTrace {
    pub ticker: String,
    pub events: Vec<TraceEvent>,
}

impl AcquisitionTrace {
    pub fn new(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            events: Vec::new(),
        }
    }

    fn record(&mut self, state: AcquisitionState, detail: Option<String>) {
        self.events.push(TraceEvent { state, detail });
    }

    /// Attempts beyond the first within a strategy.
    pub fn retries(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.state, AcquisitionState::Attempting { attempt, .. } if attempt > 0))
            .count()
    }

    pub fn fallbacks(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.state, AcquisitionState::Fallback { .. }))
            .count()
    }

    pub fn final_state(&self) -> Option<&AcquisitionState> {
        self.events.last().map(|e| &e.state)
    }
}

#[derive(Debug, Clone)]
pub struct Acquired {
    pub series: TimeSeries,
    pub report: ValidationReport,
    pub strategy: FetchStrategy,
    pub trace: AcquisitionTrace,
}

/// Per-cycle read-only price cache built from one batch pull.
#[derive(Debug, Clone, Default)]
pub struct BatchPriceCache {
    series: BTreeMap<String, Arc<TimeSeries>>,
}

impl BatchPriceCache {
    pub fn get(&self, ticker: &str) -> Option<Arc<TimeSeries>> {
        self.series.get(ticker).cloned()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.series.contains_key(ticker)
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl FromIterator<TimeSeries> for BatchPriceCache {
    fn from_iter<I: IntoIterator<Item = TimeSeries>>(iter: I) -> Self {
        Self {
            series: iter
                .into_iter()
                .map(|s| (s.ticker.clone(), Arc::new(s)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AcquisitionSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_tickers: Vec<String>,
    pub batch_requests: usize,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub cache: BatchPriceCache,
    pub summary: AcquisitionSummary,
    pub failures: BTreeMap<String, RadarError>,
}

/// Error for a ticker whose plan ran out. When every strategy delivered data
/// and every table was rejected by the quality gate, the failure is a
/// validation one; any source error makes the data unavailable.
fn exhausted(ticker: &str, reasons: Vec<String>, source_failed: bool) -> RadarError {
    if source_failed || reasons.is_empty() {
        RadarError::DataUnavailable {
            ticker: ticker.to_string(),
            reasons,
        }
    } else {
        RadarError::ValidationFailure {
            ticker: ticker.to_string(),
            reason: reasons.join("; "),
        }
    }
}

pub struct DataAcquisitionService {
    source: Arc<dyn MarketDataSource>,
    config: AcquisitionConfig,
}

impl DataAcquisitionService {
    pub fn new(source: Arc<dyn MarketDataSource>, config: AcquisitionConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn plan(&self, period: &str, interval: &str) -> Vec<FetchStrategy> {
        fallback_plan(period, interval, &self.config.fallback_periods)
    }

    async fn attempt(&self, ticker: &str, strategy: &FetchStrategy) -> Result<RawBarTable, SourceError> {
        let timeout = self.config.retry.attempt_timeout;
        let request = self
            .source
            .fetch_bars(ticker, &strategy.period, &strategy.interval, timeout);
        match tokio::time::timeout(timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(timeout)),
        }
    }

    fn after_strategy(&self, strategy: usize, plan_len: usize) -> AcquisitionState {
        if strategy + 1 < plan_len {
            AcquisitionState::Fallback {
                from: strategy,
                to: strategy + 1,
            }
        } else {
            AcquisitionState::Exhausted
        }
    }

    /// Fetch one ticker, walking the fallback plan until a series passes
    /// validation.
    pub async fn fetch(&self, ticker: &str, period: &str, interval: &str) -> Result<Acquired, RadarError> {
        let plan = self.plan(period, interval);
        let policy = &self.config.retry;
        let mut trace = AcquisitionTrace::new(ticker);
        let mut reasons: Vec<String> = Vec::new();
        let mut source_failed = false;
        let mut state = AcquisitionState::Attempting {
            strategy: 0,
            attempt: 0,
        };

        loop {
            match state.clone() {
                AcquisitionState::Attempting { strategy, attempt } => {
                    trace.record(state.clone(), None);
                    let current = &plan[strategy];
                    tracing::debug!(ticker, strategy = %current, attempt, "fetch attempt");

                    state = match self.attempt(ticker, current).await {
                        Ok(table) => match validation::validate(ticker, &table, self.config.max_nan_ratio) {
                            Ok(validated) => {
                                trace.record(AcquisitionState::Succeeded { strategy }, None);
                                tracing::info!(
                                    ticker,
                                    strategy = %current,
                                    bars = validated.series.len(),
                                    retries = trace.retries(),
                                    fallbacks = trace.fallbacks(),
                                    "series acquired"
                                );
                                return Ok(Acquired {
                                    series: validated.series,
                                    report: validated.report,
                                    strategy: current.clone(),
                                    trace,
                                });
                            }
                            Err(report) => {
                                let reason = report.reason().unwrap_or_else(|| "rejected".into());
                                tracing::warn!(ticker, strategy = %current, %reason, "validation failed");
                                reasons.push(format!("{current}: {reason}"));
                                self.after_strategy(strategy, plan.len())
                            }
                        },
                        Err(err) => {
                            tracing::warn!(ticker, strategy = %current, attempt, error = %err, "fetch attempt failed");
                            let next = attempt + 1;
                            if next < policy.max_attempts {
                                let delay = policy.backoff.delay_before(next);
                                AcquisitionState::BackingOff {
                                    strategy,
                                    attempt: next,
                                    delay_ms: delay.as_millis() as u64,
                                }
                            } else {
                                source_failed = true;
                                reasons.push(format!("{current}: {err}"));
                                self.after_strategy(strategy, plan.len())
                            }
                        }
                    };
                }
                AcquisitionState::BackingOff {
                    strategy,
                    attempt,
                    delay_ms,
                } => {
                    trace.record(state.clone(), None);
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    state = AcquisitionState::Attempting { strategy, attempt };
                }
                AcquisitionState::Fallback { to, .. } => {
                    trace.record(state.clone(), reasons.last().cloned());
                    tracing::info!(ticker, next = %plan[to], "falling back");
                    state = AcquisitionState::Attempting {
                        strategy: to,
                        attempt: 0,
                    };
                }
                // Succeeded returns from the Attempting arm and never loops back.
                AcquisitionState::Exhausted | AcquisitionState::Succeeded { .. } => {
                    trace.record(AcquisitionState::Exhausted, None);
                    tracing::error!(ticker, strategies = plan.len(), "all fetch strategies exhausted");
                    return Err(exhausted(ticker, reasons, source_failed));
                }
            }
        }
    }

    /// Fetch a whole universe with one batch request per strategy attempt.
    ///
    /// Tickers that fail validation move to the next strategy's batch;
    /// tickers hit by source errors are retried within the strategy.
    pub async fn fetch_batch(&self, tickers: &[String], period: &str, interval: &str) -> BatchOutcome {
        let plan = self.plan(period, interval);
        let policy = &self.config.retry;
        let mut resolved: Vec<TimeSeries> = Vec::new();
        let mut reasons: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut source_failed: BTreeSet<String> = BTreeSet::new();
        let mut unresolved: BTreeSet<String> = tickers.iter().cloned().collect();
        let mut batch_requests = 0usize;

        for strategy in &plan {
            if unresolved.is_empty() {
                break;
            }
            let mut pending: Vec<String> = unresolved.iter().cloned().collect();
            let mut rejected: Vec<String> = Vec::new();

            for attempt in 0..policy.max_attempts {
                if pending.is_empty() {
                    break;
                }
                let delay = policy.backoff.delay_before(attempt);
                if !delay.is_zero() {
                    tracing::debug!(strategy = %strategy, attempt, delay_ms = delay.as_millis() as u64, "batch backoff");
                    tokio::time::sleep(delay).await;
                }

                batch_requests += 1;
                let timeout = policy.attempt_timeout;
                let request = self
                    .source
                    .fetch_batch(&pending, &strategy.period, &strategy.interval, timeout);
                let (mut results, timed_out) = match tokio::time::timeout(timeout, request).await {
                    Ok(results) => (results, false),
                    Err(_) => (BTreeMap::new(), true),
                };

                let mut retry: Vec<String> = Vec::new();
                for ticker in pending.drain(..) {
                    let result = results.remove(&ticker).unwrap_or_else(|| {
                        if timed_out {
                            Err(SourceError::Timeout(timeout))
                        } else {
                            Err(SourceError::NotFound(ticker.clone()))
                        }
                    });
                    match result {
                        Ok(table) => match validation::validate(&ticker, &table, self.config.max_nan_ratio) {
                            Ok(validated) => {
                                unresolved.remove(&ticker);
                                resolved.push(validated.series);
                            }
                            Err(report) => {
                                let reason = report.reason().unwrap_or_else(|| "rejected".into());
                                tracing::warn!(ticker = %ticker, strategy = %strategy, %reason, "validation failed");
                                reasons.entry(ticker.clone()).or_default().push(format!("{strategy}: {reason}"));
                                rejected.push(ticker);
                            }
                        },
                        Err(err) => {
                            if attempt + 1 == policy.max_attempts {
                                source_failed.insert(ticker.clone());
                                reasons.entry(ticker.clone()).or_default().push(format!("{strategy}: {err}"));
                            } else {
                                tracing::warn!(ticker = %ticker, strategy = %strategy, attempt, error = %err, "batch fetch failed");
                            }
                            retry.push(ticker);
                        }
                    }
                }
                pending = retry;
            }
            if !unresolved.is_empty() {
                tracing::info!(strategy = %strategy, remaining = unresolved.len(), rejected = rejected.len(), "batch strategy done");
            }
        }

        let mut failures = BTreeMap::new();
        let mut failed_tickers = Vec::new();
        for ticker in tickers {
            if unresolved.contains(ticker) {
                failed_tickers.push(ticker.clone());
                failures.insert(
                    ticker.clone(),
                    exhausted(
                        ticker,
                        reasons.remove(ticker).unwrap_or_default(),
                        source_failed.contains(ticker),
                    ),
                );
            }
        }

        let summary = AcquisitionSummary {
            attempted: tickers.len(),
            succeeded: resolved.len(),
            failed: failed_tickers.len(),
            failed_tickers,
            batch_requests,
        };
        tracing::info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "batch acquisition finished"
        );

        BatchOutcome {
            cache: resolved.into_iter().collect(),
            summary,
            failures,
        }
    }
}
