//! Core domain types and logic.

pub mod acquisition;
pub mod anomaly;
pub mod config_validation;
pub mod cycle;
pub mod error;
pub mod indicator;
pub mod indicator_helpers;
pub mod ohlcv;
pub mod radar;
pub mod regime;
pub mod scanner;
pub mod signal;
pub mod thresholds;
pub mod universe;
pub mod validation;
