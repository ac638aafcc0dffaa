//! CSV bar file data source.
//!
//! Looks up `<dir>/<TICKER>_<interval>.csv` first, then `<dir>/<TICKER>.csv`.
//! The header must name a `timestamp` (or `date`) column; price and volume
//! columns are matched by name and anything else is ignored. Empty or
//! unparsable cells become NaN so the quality gate can judge them.

use crate::domain::acquisition::period_days;
use crate::domain::ohlcv::{Column, RawBarTable};
use crate::ports::market_data_port::{MarketDataSource, SourceError};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn candidate_paths(&self, ticker: &str, interval: &str) -> [PathBuf; 2] {
        [
            self.base_path.join(format!("{}_{}.csv", ticker, interval)),
            self.base_path.join(format!("{}.csv", ticker)),
        ]
    }

    async fn read_file(&self, ticker: &str, interval: &str) -> Result<String, SourceError> {
        for path in self.candidate_paths(ticker, interval) {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    tracing::debug!(ticker, path = %path.display(), "reading bar file");
                    return Ok(content);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(SourceError::Transport(format!(
                        "failed to read {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }
        Err(SourceError::NotFound(ticker.to_string()))
    }
}

#[async_trait]
impl MarketDataSource for CsvAdapter {
    async fn fetch_bars(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
        _timeout: Duration,
    ) -> Result<RawBarTable, SourceError> {
        let content = self.read_file(ticker, interval).await?;
        let table = parse_table(&content)?;
        let table = restrict_to_period(table, period);
        if table.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(table)
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_cell(raw: Option<&str>) -> f64 {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Parse CSV content into an unvalidated table.
pub fn parse_table(content: &str) -> Result<RawBarTable, SourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| SourceError::Transport(format!("CSV header error: {}", e)))?
        .clone();

    let time_idx = headers
        .iter()
        .position(|h| {
            matches!(
                h.trim().to_lowercase().as_str(),
                "timestamp" | "date" | "datetime"
            )
        })
        .ok_or_else(|| SourceError::Transport("missing timestamp column".into()))?;

    let mut column_idx: Vec<(Column, usize)> = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if let Some(col) = Column::parse(name) {
            // first match wins so `close` beats a later `adj close`
            if !column_idx.iter().any(|(c, _)| *c == col) {
                column_idx.push((col, idx));
            }
        }
    }

    let mut table = RawBarTable::default();
    for (col, _) in &column_idx {
        table.columns.insert(*col, Vec::new());
    }

    for (line, result) in rdr.records().enumerate() {
        let record =
            result.map_err(|e| SourceError::Transport(format!("CSV parse error: {}", e)))?;
        let raw_ts = record.get(time_idx).unwrap_or_default();
        let Some(ts) = parse_timestamp(raw_ts) else {
            return Err(SourceError::Transport(format!(
                "invalid timestamp {:?} on row {}",
                raw_ts,
                line + 2
            )));
        };
        table.timestamps.push(ts);
        for (col, idx) in &column_idx {
            if let Some(values) = table.columns.get_mut(col) {
                values.push(parse_cell(record.get(*idx)));
            }
        }
    }

    Ok(table)
}

/// Keep only rows within `period` of the newest timestamp.
fn restrict_to_period(table: RawBarTable, period: &str) -> RawBarTable {
    let Some(last) = table.timestamps.iter().max().copied() else {
        return table;
    };
    let cutoff = match period.trim() {
        "max" => return table,
        "ytd" => NaiveDate::from_ymd_opt(last.year(), 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        other => period_days(other).map(|days| last - chrono::Duration::days(days)),
    };
    let Some(cutoff) = cutoff else {
        return table;
    };

    let keep: Vec<bool> = table.timestamps.iter().map(|ts| *ts >= cutoff).collect();
    let timestamps = table
        .timestamps
        .iter()
        .zip(&keep)
        .filter(|(_, k)| **k)
        .map(|(ts, _)| *ts)
        .collect();
    let columns: BTreeMap<Column, Vec<f64>> = table
        .columns
        .into_iter()
        .map(|(col, values)| {
            let kept = values
                .into_iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| v)
                .collect();
            (col, kept)
        })
        .collect();
    RawBarTable {
        timestamps,
        columns,
    }
}
