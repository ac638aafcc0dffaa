//! One analysis cycle.
//!
//! Order of work:
//! 1. Acquire the benchmark and classify the regime. Nothing downstream
//!    starts until the regime exists; a failure here aborts the cycle.
//! 2. Pull the whole universe in batch into a read-only price cache.
//! 3. Analyse tickers on blocking workers, at most `worker_threads` at once.
//!    Workers share only the cache, the regime snapshot and atomic counters.
//! 4. Screen radars and rank the scan over the per-ticker results.
//!
//! Setting the cancel flag stops new tickers from starting; finished results
//! are kept and the remaining tickers are reported as cancelled.

use crate::domain::acquisition::{AcquisitionSummary, DataAcquisitionService};
use crate::domain::anomaly::{Alert, AnomalyDetector};
use crate::domain::config_validation::CycleConfig;
use crate::domain::error::{FailureCategory, RadarError};
use crate::domain::indicator::compute;
use crate::domain::ohlcv::TimeSeries;
use crate::domain::radar::{RadarCandidate, RadarSnapshot, TacticalRadarBank};
use crate::domain::regime::{self, RegimeState};
use crate::domain::scanner::{MarketScanner, ScanCandidate, ScanMetrics, fetch_sentiment};
use crate::domain::signal::{self, Signal};
use crate::domain::thresholds::Thresholds;
use crate::ports::market_data_port::MarketDataSource;
use crate::ports::sentiment_port::SentimentSource;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Everything computed for one ticker.
#[derive(Debug, Clone)]
pub struct TickerAnalysis {
    pub ticker: String,
    pub signal: Signal,
    pub radar: Option<RadarSnapshot>,
    pub scan: Option<ScanMetrics>,
    pub alerts: Vec<Alert>,
}

/// Pure per-ticker pipeline: indicators, signal, radar and scan inputs,
/// anomaly alerts.
pub fn analyze(
    series: &TimeSeries,
    regime: &RegimeState,
    reference: Option<&TimeSeries>,
    thresholds: &Thresholds,
) -> Result<TickerAnalysis, RadarError> {
    let ticker = series.ticker.as_str();
    let set = compute(series)?;
    let signal = signal::generate(ticker, series, &set, regime, thresholds);
    let reference = reference.filter(|r| r.ticker != series.ticker);
    let alerts = AnomalyDetector::new(thresholds.clone()).detect(ticker, series, &set, reference);
    Ok(TickerAnalysis {
        ticker: ticker.to_string(),
        signal,
        radar: RadarSnapshot::from_indicators(series, &set),
        scan: ScanMetrics::from_indicators(series, &set),
        alerts,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub ticker: String,
    pub category: FailureCategory,
    pub message: String,
}

impl FailureRecord {
    fn from_error(ticker: &str, err: &RadarError) -> Self {
        Self {
            ticker: ticker.to_string(),
            category: err.category(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub regime: RegimeState,
    pub signals: Vec<Signal>,
    pub radar: Vec<RadarCandidate>,
    pub scan: Vec<ScanCandidate>,
    pub alerts: Vec<Alert>,
    pub sentiment: Option<f64>,
    pub acquisition: AcquisitionSummary,
    pub analysed: usize,
    pub failures: Vec<FailureRecord>,
    pub cancelled: Vec<String>,
}

pub struct CycleRunner {
    acquisition: DataAcquisitionService,
    sentiment: Option<Arc<dyn SentimentSource>>,
    config: CycleConfig,
    cancel: Arc<AtomicBool>,
}

impl CycleRunner {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        sentiment: Option<Arc<dyn SentimentSource>>,
        config: CycleConfig,
    ) -> Self {
        Self {
            acquisition: DataAcquisitionService::new(source, config.acquisition.clone()),
            sentiment,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between tickers.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    async fn classify_regime(&self) -> Result<Arc<RegimeState>, RadarError> {
        let benchmark = &self.config.benchmark;
        let acquired = self
            .acquisition
            .fetch(benchmark, &self.config.regime_period, &self.config.interval)
            .await?;
        let series = acquired.series;
        let thresholds = self.config.thresholds.clone();
        let state = tokio::task::spawn_blocking(move || {
            let set = compute(&series)?;
            regime::classify(&series, &set, &thresholds)
        })
        .await
        .map_err(|e| RadarError::computation(benchmark, format!("regime worker failed: {e}")))??;
        Ok(Arc::new(state))
    }

    async fn paired_reference(&self) -> Option<Arc<TimeSeries>> {
        let ticker = self.config.paired_reference.as_deref()?;
        match self
            .acquisition
            .fetch(ticker, &self.config.period, &self.config.interval)
            .await
        {
            Ok(acquired) => Some(Arc::new(acquired.series)),
            Err(e) => {
                tracing::warn!(reference = ticker, error = %e, "paired reference unavailable, correlation check skipped");
                None
            }
        }
    }

    pub async fn run(&self) -> Result<CycleReport, RadarError> {
        let config = &self.config;
        self.config.thresholds.validate()?;

        let regime = self.classify_regime().await?;
        tracing::info!(regime = %regime.regime, confidence = regime.confidence, "cycle regime fixed");

        let batch = self
            .acquisition
            .fetch_batch(&config.universe.tickers, &config.period, &config.interval)
            .await;
        let reference = self.paired_reference().await;
        let sentiment = match &self.sentiment {
            Some(source) => fetch_sentiment(source.as_ref(), config.universe.asset_class).await,
            None => None,
        };

        let mut failures: Vec<FailureRecord> = batch
            .failures
            .iter()
            .map(|(ticker, err)| FailureRecord::from_error(ticker, err))
            .collect();

        let analysed = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(Semaphore::new(config.worker_threads));
        let mut workers: JoinSet<Result<TickerAnalysis, RadarError>> = JoinSet::new();
        let mut task_tickers = HashMap::new();
        let mut cancelled = Vec::new();

        for ticker in &config.universe.tickers {
            let Some(series) = batch.cache.get(ticker) else {
                continue;
            };
            if self.cancel.load(Ordering::SeqCst) {
                cancelled.push(ticker.clone());
                continue;
            }
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| RadarError::computation(ticker, format!("worker pool closed: {e}")))?;
            if self.cancel.load(Ordering::SeqCst) {
                cancelled.push(ticker.clone());
                continue;
            }

            let regime = Arc::clone(&regime);
            let reference = reference.clone();
            let thresholds = config.thresholds.clone();
            let analysed = Arc::clone(&analysed);
            let failed = Arc::clone(&failed);
            let handle = workers.spawn_blocking(move || {
                let _permit = permit;
                let result = analyze(&series, &regime, reference.as_deref(), &thresholds);
                match &result {
                    Ok(_) => analysed.fetch_add(1, Ordering::SeqCst),
                    Err(_) => failed.fetch_add(1, Ordering::SeqCst),
                };
                result
            });
            task_tickers.insert(handle.id(), ticker.clone());
        }

        let mut results: Vec<TickerAnalysis> = Vec::new();
        while let Some(joined) = workers.join_next_with_id().await {
            match joined {
                Ok((_, Ok(analysis))) => results.push(analysis),
                Ok((id, Err(err))) => {
                    let ticker = task_tickers.get(&id).cloned().unwrap_or_default();
                    tracing::warn!(ticker = %ticker, error = %err, "ticker analysis failed");
                    failures.push(FailureRecord::from_error(&ticker, &err));
                }
                Err(join_err) => {
                    let ticker = task_tickers.get(&join_err.id()).cloned().unwrap_or_default();
                    failed.fetch_add(1, Ordering::SeqCst);
                    let err = RadarError::computation(&ticker, format!("worker panicked: {join_err}"));
                    tracing::error!(ticker = %ticker, error = %err, "ticker worker crashed");
                    failures.push(FailureRecord::from_error(&ticker, &err));
                }
            }
        }

        let universe = &config.universe;
        let order = |ticker: &str| universe.position(ticker).unwrap_or(usize::MAX);
        results.sort_by_key(|a| order(&a.ticker));
        failures.sort_by_key(|f| order(&f.ticker));

        let bank = TacticalRadarBank::new(config.thresholds.clone(), config.radar_max_candidates);
        let radar = bank.screen(
            results
                .iter()
                .filter_map(|a| a.radar.as_ref().map(|s| (a.ticker.as_str(), s))),
            &regime,
        );
        let scanner = MarketScanner::new(config.scan_strategy, config.max_candidates);
        let scan = scanner.rank(results.iter().filter_map(|a| a.scan.clone()), sentiment);

        let analysed = analysed.load(Ordering::SeqCst);
        tracing::info!(
            analysed,
            failed = failed.load(Ordering::SeqCst) + batch.summary.failed,
            cancelled = cancelled.len(),
            radar = radar.len(),
            scan = scan.len(),
            "cycle complete"
        );

        let mut signals = Vec::with_capacity(results.len());
        let mut alerts = Vec::new();
        for analysis in results {
            signals.push(analysis.signal);
            alerts.extend(analysis.alerts);
        }

        Ok(CycleReport {
            regime: regime.as_ref().clone(),
            signals,
            radar,
            scan,
            alerts,
            sentiment,
            acquisition: batch.summary,
            analysed,
            failures,
            cancelled,
        })
    }
}
