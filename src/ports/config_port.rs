//! Configuration access port.
//!
//! Adapters only supply raw string lookups; typed accessors are provided
//! methods so every adapter parses and reports bad values the same way.

use crate::domain::error::RadarError;
use std::str::FromStr;

pub trait ConfigPort: Send + Sync {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Trimmed value, with blank values treated as absent.
    fn get_trimmed(&self, section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_f64(&self, section: &str, key: &str) -> Result<Option<f64>, RadarError> {
        parse_value(self.get_trimmed(section, key), section, key)
    }

    fn get_usize(&self, section: &str, key: &str) -> Result<Option<usize>, RadarError> {
        parse_value(self.get_trimmed(section, key), section, key)
    }

    fn get_u64(&self, section: &str, key: &str) -> Result<Option<u64>, RadarError> {
        parse_value(self.get_trimmed(section, key), section, key)
    }

    /// Comma-separated list; blank items are dropped.
    fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_trimmed(section, key).map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }
}

fn parse_value<T: FromStr>(
    raw: Option<String>,
    section: &str,
    key: &str,
) -> Result<Option<T>, RadarError> {
    match raw {
        None => Ok(None),
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| RadarError::config_invalid(section, key, format!("cannot parse {v:?}"))),
    }
}
