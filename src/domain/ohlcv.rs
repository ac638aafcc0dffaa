//! OHLCV bars, validated series and the raw table returned by data sources.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Minimum number of bars for a series to be usable.
pub const MIN_BARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// A validated bar series: ascending unique timestamps, no missing cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub ticker: String,
    pub bars: Vec<OhlcvBar>,
}

impl TimeSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<OhlcvBar>) -> Self {
        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn is_usable(&self) -> bool {
        self.bars.len() >= MIN_BARS
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// The five required columns of a bar table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::Volume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Open => "open",
            Column::High => "high",
            Column::Low => "low",
            Column::Close => "close",
            Column::Volume => "volume",
        }
    }

    pub fn parse(name: &str) -> Option<Column> {
        match name.trim().to_lowercase().as_str() {
            "open" => Some(Column::Open),
            "high" => Some(Column::High),
            "low" => Some(Column::Low),
            "close" | "adj close" | "adj_close" => Some(Column::Close),
            "volume" => Some(Column::Volume),
            _ => None,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated bar table as delivered by a data source.
///
/// Columns may be absent and cells may be NaN. Rows are not guaranteed to be
/// ordered or unique by timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBarTable {
    pub timestamps: Vec<NaiveDateTime>,
    pub columns: BTreeMap<Column, Vec<f64>>,
}

impl RawBarTable {
    pub fn row_count(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn missing_columns(&self) -> Vec<Column> {
        Column::ALL
            .iter()
            .copied()
            .filter(|c| !self.columns.contains_key(c))
            .collect()
    }

    /// Build a complete table from already-formed bars.
    pub fn from_bars(bars: &[OhlcvBar]) -> Self {
        let mut columns = BTreeMap::new();
        columns.insert(Column::Open, bars.iter().map(|b| b.open).collect());
        columns.insert(Column::High, bars.iter().map(|b| b.high).collect());
        columns.insert(Column::Low, bars.iter().map(|b| b.low).collect());
        columns.insert(Column::Close, bars.iter().map(|b| b.close).collect());
        columns.insert(Column::Volume, bars.iter().map(|b| b.volume).collect());
        Self {
            timestamps: bars.iter().map(|b| b.timestamp).collect(),
            columns,
        }
    }
}
