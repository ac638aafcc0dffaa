//! Market data port: raw OHLCV retrieval from an upstream source.

use crate::domain::ohlcv::RawBarTable;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

/// Failure reported by a data source. Every variant is retryable within one
/// fetch strategy.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("rate limited by upstream")]
    RateLimited,

    #[error("no data found for {0}")]
    NotFound(String),

    #[error("upstream returned an empty table")]
    Empty,
}

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch the raw bar table for one ticker. `period` is a lookback such as
    /// `1y` or `6mo`; `interval` is the bar size such as `1d` or `1wk`.
    async fn fetch_bars(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
        timeout: Duration,
    ) -> Result<RawBarTable, SourceError>;

    /// Fetch many tickers in one request. Sources without a native batch
    /// endpoint fall back to one request per ticker.
    async fn fetch_batch(
        &self,
        tickers: &[String],
        period: &str,
        interval: &str,
        timeout: Duration,
    ) -> BTreeMap<String, Result<RawBarTable, SourceError>> {
        let mut out = BTreeMap::new();
        for ticker in tickers {
            let result = self.fetch_bars(ticker, period, interval, timeout).await;
            out.insert(ticker.clone(), result);
        }
        out
    }
}
