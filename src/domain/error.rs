//! Domain error types.

use serde::Serialize;
use std::fmt;

/// Failure category reported in the end-of-cycle summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCategory {
    DataUnavailable,
    ValidationFailure,
    ComputationError,
    ConfigurationError,
    Io,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureCategory::DataUnavailable => "DATA_UNAVAILABLE",
            FailureCategory::ValidationFailure => "VALIDATION_FAILURE",
            FailureCategory::ComputationError => "COMPUTATION_ERROR",
            FailureCategory::ConfigurationError => "CONFIGURATION_ERROR",
            FailureCategory::Io => "IO",
        };
        f.write_str(name)
    }
}

/// Top-level error type for marketradar.
#[derive(Debug, thiserror::Error)]
pub enum RadarError {
    #[error("data unavailable for {ticker}: {}", reasons.join("; "))]
    DataUnavailable { ticker: String, reasons: Vec<String> },

    #[error("validation failed for {ticker}: {reason}")]
    ValidationFailure { ticker: String, reason: String },

    #[error("computation error for {ticker}: {reason}")]
    Computation { ticker: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown scan strategy: {0}")]
    UnknownStrategy(String),

    #[error(transparent)]
    Universe(#[from] crate::domain::universe::UniverseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RadarError {
    pub fn computation(ticker: &str, reason: impl Into<String>) -> Self {
        RadarError::Computation {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }

    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        RadarError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> FailureCategory {
        match self {
            RadarError::DataUnavailable { .. } => FailureCategory::DataUnavailable,
            RadarError::ValidationFailure { .. } => FailureCategory::ValidationFailure,
            RadarError::Computation { .. } => FailureCategory::ComputationError,
            RadarError::ConfigParse { .. }
            | RadarError::ConfigMissing { .. }
            | RadarError::ConfigInvalid { .. }
            | RadarError::UnknownStrategy(_)
            | RadarError::Universe(_) => FailureCategory::ConfigurationError,
            RadarError::Io(_) => FailureCategory::Io,
        }
    }
}

impl From<&RadarError> for std::process::ExitCode {
    fn from(err: &RadarError) -> Self {
        let code: u8 = match err.category() {
            FailureCategory::Io => 1,
            FailureCategory::ConfigurationError => 2,
            FailureCategory::DataUnavailable | FailureCategory::ValidationFailure => 5,
            FailureCategory::ComputationError => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_unavailable_lists_reasons() {
        let err = RadarError::DataUnavailable {
            ticker: "AAPL".into(),
            reasons: vec!["6mo/1d: only 10 bars".into(), "3mo/1d: timeout".into()],
        };
        assert_eq!(
            err.to_string(),
            "data unavailable for AAPL: 6mo/1d: only 10 bars; 3mo/1d: timeout"
        );
        assert_eq!(err.category(), FailureCategory::DataUnavailable);
    }

    #[test]
    fn config_errors_share_category() {
        let missing = RadarError::ConfigMissing {
            section: "cycle".into(),
            key: "universe".into(),
        };
        let unknown = RadarError::UnknownStrategy("yolo".into());
        assert_eq!(missing.category(), FailureCategory::ConfigurationError);
        assert_eq!(unknown.category(), FailureCategory::ConfigurationError);
    }

    #[test]
    fn computation_helper_builds_variant() {
        let err = RadarError::computation("BTC-USD", "RSI not defined");
        assert!(matches!(err, RadarError::Computation { ref ticker, .. } if ticker == "BTC-USD"));
    }

    #[test]
    fn category_display_is_screaming_case() {
        assert_eq!(FailureCategory::ComputationError.to_string(), "COMPUTATION_ERROR");
    }
}
