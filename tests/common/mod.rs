#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use marketradar::domain::ohlcv::{Column, RawBarTable};
use marketradar::ports::market_data_port::{MarketDataSource, SourceError};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub use marketradar::domain::ohlcv::OhlcvBar;

/// Scripted market data source.
///
/// Tables are keyed by ticker, optionally per period. A ticker/period pair
/// can be told to fail its first N requests with a transport error or a
/// rate-limit response.
pub struct MockMarketSource {
    any_period: HashMap<String, RawBarTable>,
    per_period: HashMap<(String, String), RawBarTable>,
    failures: Mutex<HashMap<(String, String), (u32, SourceError)>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockMarketSource {
    pub fn new() -> Self {
        Self {
            any_period: HashMap::new(),
            per_period: HashMap::new(),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.any_period
            .insert(ticker.to_string(), RawBarTable::from_bars(&bars));
        self
    }

    pub fn with_table(mut self, ticker: &str, table: RawBarTable) -> Self {
        self.any_period.insert(ticker.to_string(), table);
        self
    }

    pub fn with_period_table(mut self, ticker: &str, period: &str, table: RawBarTable) -> Self {
        self.per_period
            .insert((ticker.to_string(), period.to_string()), table);
        self
    }

    pub fn failing_first(self, ticker: &str, period: &str, count: u32) -> Self {
        self.erroring_first(ticker, period, count, SourceError::Transport("connection reset".into()))
    }

    pub fn throttled_first(self, ticker: &str, period: &str, count: u32) -> Self {
        self.erroring_first(ticker, period, count, SourceError::RateLimited)
    }

    fn erroring_first(self, ticker: &str, period: &str, count: u32, error: SourceError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert((ticker.to_string(), period.to_string()), (count, error));
        self
    }

    /// Every (ticker, period) requested so far, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn periods_requested(&self, ticker: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(t, _)| t == ticker)
            .map(|(_, p)| p)
            .collect()
    }
}

#[async_trait]
impl MarketDataSource for MockMarketSource {
    async fn fetch_bars(
        &self,
        ticker: &str,
        period: &str,
        _interval: &str,
        _timeout: Duration,
    ) -> Result<RawBarTable, SourceError> {
        let key = (ticker.to_string(), period.to_string());
        self.calls.lock().unwrap().push(key.clone());

        if let Some((remaining, error)) = self.failures.lock().unwrap().get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(error.clone());
            }
        }

        self.per_period
            .get(&key)
            .or_else(|| self.any_period.get(ticker))
            .cloned()
            .ok_or_else(|| SourceError::NotFound(ticker.to_string()))
    }
}

pub fn day(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::days(i as i64)
}

/// Deterministic zig-zag around a linear drift.
pub fn wavy_bars(n: usize, start: f64, drift: f64) -> Vec<OhlcvBar> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            let close = start + t * drift + (t * 0.35).sin() * 4.0;
            OhlcvBar {
                timestamp: day(i),
                open: close - 0.3,
                high: close + 1.0 + (t * 0.7).cos().abs(),
                low: close - 1.0 - (t * 0.5).sin().abs(),
                close,
                volume: 10_000.0 + ((t * 1.3).sin() + 1.0) * 5_000.0,
            }
        })
        .collect()
}

/// Steady trend with a fixed daily range.
pub fn trending_bars(n: usize, start: f64, step: f64) -> Vec<OhlcvBar> {
    (0..n)
        .map(|i| {
            let close = start + step * i as f64;
            OhlcvBar {
                timestamp: day(i),
                open: close - step * 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 50_000.0,
            }
        })
        .collect()
}

/// Blank every column on the first `ratio` share of rows.
pub fn with_nan_rows(bars: &[OhlcvBar], ratio: f64) -> RawBarTable {
    let mut table = RawBarTable::from_bars(bars);
    let rows = (bars.len() as f64 * ratio).round() as usize;
    for column in Column::ALL {
        if let Some(values) = table.columns.get_mut(&column) {
            for v in values.iter_mut().take(rows) {
                *v = f64::NAN;
            }
        }
    }
    table
}

/// Write bars as a `<ticker>.csv` file in `dir`.
pub fn write_csv(dir: &std::path::Path, ticker: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    std::fs::write(dir.join(format!("{ticker}.csv")), content).unwrap();
}
