//! Sentiment readings taken from the `[sentiment]` configuration section.

use crate::domain::error::RadarError;
use crate::domain::universe::AssetClass;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::SourceError;
use crate::ports::sentiment_port::SentimentSource;
use async_trait::async_trait;

const SECTION: &str = "sentiment";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedSentimentAdapter {
    equity: Option<f64>,
    crypto: Option<f64>,
}

impl FixedSentimentAdapter {
    pub fn new(equity: Option<f64>, crypto: Option<f64>) -> Self {
        Self { equity, crypto }
    }

    /// Read `[sentiment] equity` and `crypto`. Returns `None` when neither is
    /// set so the cycle runs without a sentiment source.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Option<Self>, RadarError> {
        let equity = read_reading(config, "equity")?;
        let crypto = read_reading(config, "crypto")?;
        if equity.is_none() && crypto.is_none() {
            return Ok(None);
        }
        Ok(Some(Self::new(equity, crypto)))
    }
}

fn read_reading(config: &dyn ConfigPort, key: &str) -> Result<Option<f64>, RadarError> {
    match config.get_f64(SECTION, key)? {
        Some(v) if !(0.0..=100.0).contains(&v) => Err(RadarError::config_invalid(
            SECTION,
            key,
            format!("{v} is outside [0, 100]"),
        )),
        other => Ok(other),
    }
}

#[async_trait]
impl SentimentSource for FixedSentimentAdapter {
    async fn sentiment(&self, asset_class: AssetClass) -> Result<f64, SourceError> {
        let reading = match asset_class {
            AssetClass::Equity => self.equity,
            AssetClass::Crypto => self.crypto,
        };
        reading.ok_or_else(|| SourceError::NotFound(format!("{asset_class} sentiment")))
    }
}
