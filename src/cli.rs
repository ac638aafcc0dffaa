//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::fixed_sentiment_adapter::FixedSentimentAdapter;
use crate::domain::acquisition::{AcquisitionTrace, DataAcquisitionService, FetchStrategy};
use crate::domain::config_validation::{
    CycleConfig, DEFAULT_INTERVAL, DEFAULT_PERIOD, acquisition_config, validate_cycle_config,
};
use crate::domain::cycle::{CycleReport, CycleRunner};
use crate::domain::error::RadarError;
use crate::domain::indicator::compute;
use crate::domain::indicator::set::LatestReadings;
use crate::domain::scanner::ScanStrategy;
use crate::domain::thresholds::Thresholds;
use crate::domain::validation::ValidationReport;
use crate::ports::config_port::ConfigPort;
use crate::ports::sentiment_port::SentimentSource;

#[derive(Parser, Debug)]
#[command(
    name = "marketradar",
    version,
    about = "Market regime, signal and radar screening over OHLCV data"
)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one analysis cycle over the configured universe
    Cycle {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding `<TICKER>.csv` bar files
        #[arg(short, long)]
        data_dir: PathBuf,
        /// Override `[cycle] scan_strategy`
        #[arg(long)]
        strategy: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Acquire and validate one ticker, printing the quality report
    Fetch {
        ticker: String,
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print the latest indicator readings for one ticker
    Indicators {
        ticker: String,
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Check a configuration file without fetching anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub async fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Cycle {
            config,
            data_dir,
            strategy,
            json,
        } => run_cycle(&config, data_dir, strategy.as_deref(), json).await,
        Command::Fetch {
            ticker,
            data_dir,
            config,
            period,
            interval,
            json,
        } => {
            let request = TickerRequest::new(ticker, data_dir, config, period, interval);
            run_fetch(request, json).await
        }
        Command::Indicators {
            ticker,
            data_dir,
            config,
            period,
            interval,
            json,
        } => {
            let request = TickerRequest::new(ticker, data_dir, config, period, interval);
            run_indicators(request, json).await
        }
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load `path`, or an empty configuration when no file was given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, RadarError> {
    match path {
        Some(p) => {
            tracing::info!(path = %p.display(), "loading configuration");
            FileConfigAdapter::from_file(p)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), RadarError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| RadarError::Io(std::io::Error::other(e)))?;
    println!("{text}");
    Ok(())
}

async fn run_cycle(
    config_path: &Path,
    data_dir: PathBuf,
    strategy_override: Option<&str>,
    json: bool,
) -> Result<(), RadarError> {
    let adapter = load_config(Some(config_path))?;
    let mut config = CycleConfig::from_config(&adapter)?;
    if let Some(name) = strategy_override {
        config.scan_strategy = name.parse::<ScanStrategy>()?;
    }
    let sentiment: Option<Arc<dyn SentimentSource>> =
        FixedSentimentAdapter::from_config(&adapter)?.map(|s| Arc::new(s) as Arc<dyn SentimentSource>);

    tracing::info!(
        tickers = config.universe.count(),
        benchmark = %config.benchmark,
        data_dir = %data_dir.display(),
        "starting cycle"
    );

    let runner = CycleRunner::new(Arc::new(CsvAdapter::new(data_dir)), sentiment, config);
    let cancel = runner.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing in-flight tickers");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let report = runner.run().await;
    interrupt.abort();
    let report = report?;

    if json {
        print_json(&report)
    } else {
        print_cycle_summary(&report);
        Ok(())
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn print_cycle_summary(report: &CycleReport) {
    println!(
        "=== Regime ({}) ===\n{}  confidence {:.1}",
        report.regime.benchmark, report.regime.regime, report.regime.confidence
    );

    println!("\n=== Signals ===");
    for s in &report.signals {
        let tags: Vec<&str> = s.alerts.as_slice().iter().map(|a| a.as_str()).collect();
        println!(
            "  {:<10} {:<9} {:<7} price {:>10.2}  rsi {:>6}  adx {:>6}  [{}]",
            s.ticker,
            s.recommendation.to_string(),
            s.priority.to_string(),
            s.price,
            fmt_opt(s.rsi),
            fmt_opt(s.adx),
            tags.join(", ")
        );
    }

    println!("\n=== Tactical Radar ===");
    if report.radar.is_empty() {
        println!("  no candidates");
    }
    for c in &report.radar {
        println!(
            "  {:<10} radar {} ({})  score {:.1}",
            c.ticker,
            c.radar_id.number(),
            c.radar_id.name(),
            c.score
        );
    }

    println!("\n=== Scanner ===");
    if report.scan.is_empty() {
        println!("  no candidates");
    }
    for c in &report.scan {
        println!(
            "  {:<10} total {:>5.1}  {}  momentum {:.1}  volume {:.1}  trend {:.1}  special {:.1}",
            c.ticker,
            c.breakdown.total,
            c.breakdown.confidence,
            c.breakdown.momentum,
            c.breakdown.volume,
            c.breakdown.trend,
            c.breakdown.special_signals
        );
    }

    if !report.alerts.is_empty() {
        println!("\n=== Alerts ===");
        for a in &report.alerts {
            println!(
                "  {:<10} {:<22} {:<5} {}",
                a.ticker,
                a.subtype.to_string(),
                a.severity.to_string(),
                a.message
            );
        }
    }

    println!(
        "\nAnalysed {} of {} tickers ({} batch requests)",
        report.analysed, report.acquisition.attempted, report.acquisition.batch_requests
    );
    for f in &report.failures {
        println!("  failed {:<10} {}: {}", f.ticker, f.category, f.message);
    }
    if !report.cancelled.is_empty() {
        println!("  cancelled: {}", report.cancelled.join(", "));
    }
}

/// Single-ticker command arguments.
pub struct TickerRequest {
    pub ticker: String,
    pub data_dir: PathBuf,
    pub config: Option<PathBuf>,
    pub period: Option<String>,
    pub interval: Option<String>,
}

impl TickerRequest {
    pub fn new(
        ticker: String,
        data_dir: PathBuf,
        config: Option<PathBuf>,
        period: Option<String>,
        interval: Option<String>,
    ) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            data_dir,
            config,
            period,
            interval,
        }
    }

    fn period_or(&self, config: &dyn ConfigPort) -> String {
        self.period
            .clone()
            .or_else(|| config.get_trimmed("cycle", "period"))
            .unwrap_or_else(|| DEFAULT_PERIOD.to_string())
    }

    fn interval_or(&self, config: &dyn ConfigPort) -> String {
        self.interval
            .clone()
            .or_else(|| config.get_trimmed("cycle", "interval"))
            .unwrap_or_else(|| DEFAULT_INTERVAL.to_string())
    }
}

#[derive(Debug, Serialize)]
struct FetchOutput<'a> {
    ticker: &'a str,
    strategy: &'a FetchStrategy,
    retries: usize,
    fallbacks: usize,
    report: &'a ValidationReport,
    trace: &'a AcquisitionTrace,
}

async fn run_fetch(request: TickerRequest, json: bool) -> Result<(), RadarError> {
    let adapter = load_config(request.config.as_deref())?;
    let thresholds = Thresholds::from_config(&adapter)?;
    let mut acq = acquisition_config(&adapter)?;
    acq.max_nan_ratio = thresholds.max_nan_ratio;

    let period = request.period_or(&adapter);
    let interval = request.interval_or(&adapter);
    let service = DataAcquisitionService::new(Arc::new(CsvAdapter::new(request.data_dir.clone())), acq);
    let acquired = service.fetch(&request.ticker, &period, &interval).await?;

    let output = FetchOutput {
        ticker: &request.ticker,
        strategy: &acquired.strategy,
        retries: acquired.trace.retries(),
        fallbacks: acquired.trace.fallbacks(),
        report: &acquired.report,
        trace: &acquired.trace,
    };
    if json {
        return print_json(&output);
    }

    let r = output.report;
    println!("{} via {}", output.ticker, output.strategy);
    println!("  bars:          {}", r.bar_count);
    println!("  duplicates:    {}", r.duplicates_dropped);
    println!("  NaN ratio:     {:.2}%", r.nan_ratio * 100.0);
    println!("  filled cells:  {}", r.filled_cells);
    println!("  retries:       {}", output.retries);
    println!("  fallbacks:     {}", output.fallbacks);
    Ok(())
}

#[derive(Debug, Serialize)]
struct IndicatorOutput<'a> {
    ticker: &'a str,
    bars: usize,
    latest: &'a LatestReadings,
}

async fn run_indicators(request: TickerRequest, json: bool) -> Result<(), RadarError> {
    let adapter = load_config(request.config.as_deref())?;
    let thresholds = Thresholds::from_config(&adapter)?;
    let mut acq = acquisition_config(&adapter)?;
    acq.max_nan_ratio = thresholds.max_nan_ratio;

    let period = request.period_or(&adapter);
    let interval = request.interval_or(&adapter);
    let service = DataAcquisitionService::new(Arc::new(CsvAdapter::new(request.data_dir.clone())), acq);
    let acquired = service.fetch(&request.ticker, &period, &interval).await?;

    let series = acquired.series;
    let set = compute(&series)?;
    let latest = set.latest();
    let output = IndicatorOutput {
        ticker: &request.ticker,
        bars: series.len(),
        latest: &latest,
    };
    if json {
        return print_json(&output);
    }

    println!("{} ({} bars, {})", output.ticker, output.bars, acquired.strategy);
    let value = serde_json::to_value(&latest).map_err(|e| RadarError::Io(std::io::Error::other(e)))?;
    if let serde_json::Value::Object(fields) = value {
        for (name, reading) in fields {
            println!("  {:<18} {}", name, fmt_opt(reading.as_f64()));
        }
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), RadarError> {
    let adapter = load_config(Some(config_path))?;
    validate_cycle_config(&adapter)?;
    let sentiment = FixedSentimentAdapter::from_config(&adapter)?;
    let config = CycleConfig::from_config(&adapter)?;

    println!("Configuration valid: {}", config_path.display());
    println!("  benchmark:   {}", config.benchmark);
    println!(
        "  universe:    {} tickers ({})",
        config.universe.count(),
        config.universe.asset_class
    );
    println!("  period:      {} / {}", config.period, config.interval);
    println!("  strategy:    {}", config.scan_strategy);
    println!("  workers:     {}", config.worker_threads);
    println!(
        "  sentiment:   {}",
        if sentiment.is_some() { "configured" } else { "none" }
    );
    Ok(())
}
