//! Sentiment index port (fear & greed style reading in [0, 100]).

use crate::domain::universe::AssetClass;
use crate::ports::market_data_port::SourceError;
use async_trait::async_trait;

#[async_trait]
pub trait SentimentSource: Send + Sync {
    async fn sentiment(&self, asset_class: AssetClass) -> Result<f64, SourceError>;
}
