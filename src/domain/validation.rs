//! Time-series quality gates.
//!
//! A raw table is normalised (sorted, de-duplicated, negative volume treated
//! as missing), checked against four gates in order, and on pass the
//! remaining gaps are closed by forward fill then backward fill.

use crate::domain::ohlcv::{Column, MIN_BARS, OhlcvBar, RawBarTable, TimeSeries};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_MAX_NAN_RATIO: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGate {
    NonEmpty,
    MinimumBars,
    RequiredColumns,
    NanRatio,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub ticker: String,
    pub non_empty: bool,
    pub minimum_bars: bool,
    pub required_columns: bool,
    pub nan_ratio_ok: bool,
    pub nan_ratio: f64,
    pub bar_count: usize,
    pub duplicates_dropped: usize,
    pub missing_columns: Vec<Column>,
    pub filled_cells: usize,
}

impl ValidationReport {
    fn new(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            non_empty: false,
            minimum_bars: false,
            required_columns: false,
            nan_ratio_ok: false,
            nan_ratio: 0.0,
            bar_count: 0,
            duplicates_dropped: 0,
            missing_columns: Vec::new(),
            filled_cells: 0,
        }
    }

    pub fn passed(&self) -> bool {
        self.failed_gate().is_none()
    }

    /// First gate that rejected the table, in gate order.
    pub fn failed_gate(&self) -> Option<QualityGate> {
        if !self.non_empty {
            Some(QualityGate::NonEmpty)
        } else if !self.minimum_bars {
            Some(QualityGate::MinimumBars)
        } else if !self.required_columns {
            Some(QualityGate::RequiredColumns)
        } else if !self.nan_ratio_ok {
            Some(QualityGate::NanRatio)
        } else {
            None
        }
    }

    pub fn reason(&self) -> Option<String> {
        self.failed_gate().map(|gate| match gate {
            QualityGate::NonEmpty => "empty result".to_string(),
            QualityGate::MinimumBars => {
                format!("only {} bars, minimum {}", self.bar_count, MIN_BARS)
            }
            QualityGate::RequiredColumns => {
                let names: Vec<&str> = self.missing_columns.iter().map(|c| c.as_str()).collect();
                format!("missing columns: {}", names.join(", "))
            }
            QualityGate::NanRatio => {
                format!("NaN ratio {:.1}% above limit", self.nan_ratio * 100.0)
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedSeries {
    pub series: TimeSeries,
    pub report: ValidationReport,
}

fn is_missing(column: Column, value: f64) -> bool {
    !value.is_finite() || (column == Column::Volume && value < 0.0)
}

/// Sort rows by timestamp and drop duplicate timestamps, keeping the last
/// occurrence. Columns whose length disagrees with the timestamp column are
/// dropped and reported as missing.
fn normalise(table: &RawBarTable) -> (RawBarTable, usize) {
    let rows = table.timestamps.len();
    let mut order: Vec<usize> = (0..rows).collect();
    // stable: equal timestamps keep arrival order, so the last one wins below
    order.sort_by_key(|&i| table.timestamps[i]);

    let mut kept: Vec<usize> = Vec::with_capacity(rows);
    for idx in order {
        match kept.last_mut() {
            Some(last) if table.timestamps[*last] == table.timestamps[idx] => *last = idx,
            _ => kept.push(idx),
        }
    }
    let dropped = rows - kept.len();

    let mut columns = BTreeMap::new();
    for (column, values) in &table.columns {
        if values.len() != rows {
            continue;
        }
        let cells: Vec<f64> = kept
            .iter()
            .map(|&i| {
                let v = values[i];
                if is_missing(*column, v) { f64::NAN } else { v }
            })
            .collect();
        columns.insert(*column, cells);
    }

    let timestamps = kept.iter().map(|&i| table.timestamps[i]).collect();
    (RawBarTable { timestamps, columns }, dropped)
}

/// Forward fill then backward fill. Returns the number of cells filled.
fn fill_gaps(values: &mut [f64]) -> usize {
    let mut filled = 0;
    let mut last: Option<f64> = None;
    for v in values.iter_mut() {
        if v.is_nan() {
            if let Some(prev) = last {
                *v = prev;
                filled += 1;
            }
        } else {
            last = Some(*v);
        }
    }
    let mut next: Option<f64> = None;
    for v in values.iter_mut().rev() {
        if v.is_nan() {
            if let Some(following) = next {
                *v = following;
                filled += 1;
            }
        } else {
            next = Some(*v);
        }
    }
    filled
}

/// Run the quality gates over a raw table.
///
/// On rejection the report is returned as the error; its `reason()` names
/// the first failing gate.
pub fn validate(
    ticker: &str,
    table: &RawBarTable,
    max_nan_ratio: f64,
) -> Result<ValidatedSeries, ValidationReport> {
    let mut report = ValidationReport::new(ticker);
    let (mut clean, dropped) = normalise(table);
    report.duplicates_dropped = dropped;
    report.bar_count = clean.row_count();
    report.missing_columns = clean.missing_columns();

    let present_cells: usize = clean.columns.values().map(|c| c.len()).sum();
    let nan_cells: usize = clean
        .columns
        .values()
        .map(|c| c.iter().filter(|v| v.is_nan()).count())
        .sum();
    report.nan_ratio = if present_cells == 0 {
        0.0
    } else {
        nan_cells as f64 / present_cells as f64
    };

    report.non_empty = !clean.is_empty();
    report.minimum_bars = report.bar_count >= MIN_BARS;
    report.required_columns = report.missing_columns.is_empty();
    report.nan_ratio_ok = report.nan_ratio <= max_nan_ratio;

    if !report.passed() {
        return Err(report);
    }

    for values in clean.columns.values_mut() {
        report.filled_cells += fill_gaps(values);
        if values.iter().any(|v| v.is_nan()) {
            // a column with no usable value at all cannot be filled
            report.nan_ratio_ok = false;
            return Err(report);
        }
    }

    let column = |c: Column| clean.columns.get(&c).map(Vec::as_slice).unwrap_or(&[]);
    let (open, high, low, close, volume) = (
        column(Column::Open),
        column(Column::High),
        column(Column::Low),
        column(Column::Close),
        column(Column::Volume),
    );
    let bars = clean
        .timestamps
        .iter()
        .enumerate()
        .map(|(i, &timestamp)| OhlcvBar {
            timestamp,
            open: open[i],
            high: high[i],
            low: low[i],
            close: close[i],
            volume: volume[i],
        })
        .collect();

    Ok(ValidatedSeries {
        series: TimeSeries::new(ticker, bars),
        report,
    })
}
