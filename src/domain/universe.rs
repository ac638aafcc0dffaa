//! Instrument universe parsing.
//!
//! The universe is an ordered, de-duplicated ticker list read from the
//! `[cycle] universe` key. Its order is the order results are reported in.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Asset class used to key the sentiment lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Equity,
    Crypto,
}

impl AssetClass {
    pub fn parse(value: &str) -> Option<AssetClass> {
        match value.trim().to_lowercase().as_str() {
            "equity" | "equities" | "stock" | "stocks" => Some(AssetClass::Equity),
            "crypto" | "cryptocurrency" => Some(AssetClass::Crypto),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Equity => "equity",
            AssetClass::Crypto => "crypto",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Universe {
    pub tickers: Vec<String>,
    pub asset_class: AssetClass,
}

impl Universe {
    pub fn new(tickers: Vec<String>, asset_class: AssetClass) -> Self {
        Self {
            tickers,
            asset_class,
        }
    }

    pub fn count(&self) -> usize {
        self.tickers.len()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.tickers.iter().any(|t| t == ticker)
    }

    /// Position of a ticker in the configured order, used to sort per-ticker
    /// results back into universe order.
    pub fn position(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),

    #[error("ticker list is empty")]
    Empty,

    #[error("invalid ticker {0:?}: only letters, digits, '.', '-', '^' and '=' are allowed")]
    InvalidTicker(String),
}

fn is_ticker_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')
}

/// Parse a comma-separated ticker list. Tickers are trimmed and upper-cased;
/// blanks and duplicates are rejected.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    if input.trim().is_empty() {
        return Err(UniverseError::Empty);
    }

    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !ticker.chars().all(is_ticker_char) {
            return Err(UniverseError::InvalidTicker(ticker));
        }
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}
