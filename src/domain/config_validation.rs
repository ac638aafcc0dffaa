//! Configuration validation.
//!
//! Reads the `[cycle]`, `[acquisition]` and `[thresholds]` sections into a
//! typed [`CycleConfig`], rejecting bad values before any fetch starts.

use crate::domain::acquisition::{
    AcquisitionConfig, Backoff, DEFAULT_FALLBACK_PERIODS, RetryPolicy, is_valid_interval, is_valid_period,
};
use crate::domain::error::RadarError;
use crate::domain::scanner::ScanStrategy;
use crate::domain::thresholds::Thresholds;
use crate::domain::universe::{AssetClass, Universe, parse_tickers};
use crate::ports::config_port::ConfigPort;
use std::time::Duration;

const CYCLE: &str = "cycle";
const ACQUISITION: &str = "acquisition";

pub const DEFAULT_BENCHMARK: &str = "SPY";
pub const DEFAULT_PERIOD: &str = "1y";
pub const DEFAULT_REGIME_PERIOD: &str = "2y";
pub const DEFAULT_INTERVAL: &str = "1d";
pub const DEFAULT_MAX_CANDIDATES: usize = 20;
pub const DEFAULT_RADAR_MAX_CANDIDATES: usize = 15;
const MAX_WORKER_THREADS: usize = 64;

/// Everything one cycle needs, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleConfig {
    pub benchmark: String,
    pub universe: Universe,
    pub period: String,
    pub regime_period: String,
    pub interval: String,
    pub scan_strategy: ScanStrategy,
    pub max_candidates: usize,
    pub radar_max_candidates: usize,
    pub worker_threads: usize,
    pub paired_reference: Option<String>,
    pub acquisition: AcquisitionConfig,
    pub thresholds: Thresholds,
}

impl CycleConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, RadarError> {
        let thresholds = Thresholds::from_config(config)?;
        let mut acquisition = acquisition_config(config)?;
        acquisition.max_nan_ratio = thresholds.max_nan_ratio;

        let cycle = CycleConfig {
            benchmark: benchmark(config)?,
            universe: universe(config)?,
            period: period(config, "period", DEFAULT_PERIOD)?,
            regime_period: period(config, "regime_period", DEFAULT_REGIME_PERIOD)?,
            interval: interval(config)?,
            scan_strategy: scan_strategy(config)?,
            max_candidates: positive_count(config, "max_candidates", DEFAULT_MAX_CANDIDATES)?,
            radar_max_candidates: positive_count(config, "radar_max_candidates", DEFAULT_RADAR_MAX_CANDIDATES)?,
            worker_threads: worker_threads(config)?,
            paired_reference: paired_reference(config)?,
            acquisition,
            thresholds,
        };
        tracing::debug!(
            benchmark = %cycle.benchmark,
            tickers = cycle.universe.count(),
            period = %cycle.period,
            interval = %cycle.interval,
            strategy = %cycle.scan_strategy,
            workers = cycle.worker_threads,
            "cycle configuration loaded"
        );
        Ok(cycle)
    }
}

pub fn validate_cycle_config(config: &dyn ConfigPort) -> Result<(), RadarError> {
    CycleConfig::from_config(config).map(|_| ())
}

fn benchmark(config: &dyn ConfigPort) -> Result<String, RadarError> {
    match config.get_trimmed(CYCLE, "benchmark") {
        None => Ok(DEFAULT_BENCHMARK.to_string()),
        Some(raw) => {
            let mut tickers = parse_tickers(&raw).map_err(|e| RadarError::config_invalid(CYCLE, "benchmark", e.to_string()))?;
            if tickers.len() != 1 {
                return Err(RadarError::config_invalid(CYCLE, "benchmark", "exactly one ticker expected"));
            }
            Ok(tickers.remove(0))
        }
    }
}

fn universe(config: &dyn ConfigPort) -> Result<Universe, RadarError> {
    let raw = config.get_trimmed(CYCLE, "universe").ok_or_else(|| RadarError::ConfigMissing {
        section: CYCLE.to_string(),
        key: "universe".to_string(),
    })?;
    let tickers = parse_tickers(&raw)?;
    let asset_class = match config.get_trimmed(CYCLE, "asset_class") {
        None => AssetClass::Equity,
        Some(v) => AssetClass::parse(&v)
            .ok_or_else(|| RadarError::config_invalid(CYCLE, "asset_class", format!("unknown asset class {v:?}")))?,
    };
    Ok(Universe::new(tickers, asset_class))
}

fn period(config: &dyn ConfigPort, key: &str, default: &str) -> Result<String, RadarError> {
    let value = config.get_trimmed(CYCLE, key).unwrap_or_else(|| default.to_string());
    if !is_valid_period(&value) {
        return Err(RadarError::config_invalid(
            CYCLE,
            key,
            format!("invalid period {value:?}, expected forms like 6mo, 1y, ytd, max"),
        ));
    }
    Ok(value)
}

fn interval(config: &dyn ConfigPort) -> Result<String, RadarError> {
    let value = config
        .get_trimmed(CYCLE, "interval")
        .unwrap_or_else(|| DEFAULT_INTERVAL.to_string());
    if !is_valid_interval(&value) {
        return Err(RadarError::config_invalid(CYCLE, "interval", format!("invalid interval {value:?}")));
    }
    Ok(value)
}

fn scan_strategy(config: &dyn ConfigPort) -> Result<ScanStrategy, RadarError> {
    match config.get_trimmed(CYCLE, "scan_strategy") {
        None => Ok(ScanStrategy::Momentum),
        Some(v) => v.parse(),
    }
}

fn positive_count(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, RadarError> {
    let value = config.get_usize(CYCLE, key)?.unwrap_or(default);
    if value < 1 {
        return Err(RadarError::config_invalid(CYCLE, key, format!("{key} must be at least 1")));
    }
    Ok(value)
}

fn worker_threads(config: &dyn ConfigPort) -> Result<usize, RadarError> {
    let value = config.get_usize(CYCLE, "worker_threads")?.unwrap_or(1);
    if !(1..=MAX_WORKER_THREADS).contains(&value) {
        return Err(RadarError::config_invalid(
            CYCLE,
            "worker_threads",
            format!("worker_threads must be between 1 and {MAX_WORKER_THREADS}"),
        ));
    }
    Ok(value)
}

fn paired_reference(config: &dyn ConfigPort) -> Result<Option<String>, RadarError> {
    match config.get_trimmed(CYCLE, "paired_reference") {
        None => Ok(None),
        Some(raw) => {
            let mut tickers =
                parse_tickers(&raw).map_err(|e| RadarError::config_invalid(CYCLE, "paired_reference", e.to_string()))?;
            if tickers.len() != 1 {
                return Err(RadarError::config_invalid(CYCLE, "paired_reference", "exactly one ticker expected"));
            }
            Ok(Some(tickers.remove(0)))
        }
    }
}

/// `[acquisition]` overlaid on the defaults (3 attempts, 2s exponential
/// backoff, 15s per attempt).
pub fn acquisition_config(config: &dyn ConfigPort) -> Result<AcquisitionConfig, RadarError> {
    let defaults = RetryPolicy::default();

    let max_attempts = match config.get_u64(ACQUISITION, "max_attempts")? {
        None => defaults.max_attempts,
        Some(v) if (1..=10).contains(&v) => v as u32,
        Some(_) => {
            return Err(RadarError::config_invalid(
                ACQUISITION,
                "max_attempts",
                "max_attempts must be between 1 and 10",
            ));
        }
    };

    let base = match config.get_f64(ACQUISITION, "backoff_base_secs")? {
        None => None,
        Some(v) if v >= 0.0 && v.is_finite() => Some(Duration::from_secs_f64(v)),
        Some(_) => {
            return Err(RadarError::config_invalid(
                ACQUISITION,
                "backoff_base_secs",
                "backoff_base_secs must be non-negative",
            ));
        }
    };
    let kind = config.get_trimmed(ACQUISITION, "backoff").map(|v| v.to_ascii_lowercase());
    let backoff = match (kind.as_deref(), base) {
        (None | Some("exponential"), None) => defaults.backoff,
        (None | Some("exponential"), Some(base)) => Backoff::Exponential {
            base,
            factor: 2.0,
            max: Duration::from_secs(60),
        },
        (Some("fixed"), base) => Backoff::Fixed {
            delay: base.unwrap_or(Duration::from_secs(2)),
        },
        (Some(other), _) => {
            return Err(RadarError::config_invalid(
                ACQUISITION,
                "backoff",
                format!("unknown backoff {other:?}, expected fixed or exponential"),
            ));
        }
    };

    let attempt_timeout = match config.get_f64(ACQUISITION, "attempt_timeout_secs")? {
        None => defaults.attempt_timeout,
        Some(v) if v > 0.0 && v.is_finite() => Duration::from_secs_f64(v),
        Some(_) => {
            return Err(RadarError::config_invalid(
                ACQUISITION,
                "attempt_timeout_secs",
                "attempt_timeout_secs must be positive",
            ));
        }
    };

    let fallback_periods = match config.get_list(ACQUISITION, "fallback_periods") {
        None => DEFAULT_FALLBACK_PERIODS.iter().map(|p| p.to_string()).collect(),
        Some(periods) => {
            if let Some(bad) = periods.iter().find(|p| !is_valid_period(p)) {
                return Err(RadarError::config_invalid(
                    ACQUISITION,
                    "fallback_periods",
                    format!("invalid period {bad:?}"),
                ));
            }
            periods
        }
    };

    Ok(AcquisitionConfig {
        retry: RetryPolicy {
            max_attempts,
            backoff,
            attempt_timeout,
        },
        fallback_periods,
        ..AcquisitionConfig::default()
    })
}
