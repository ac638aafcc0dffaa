//! Numeric thresholds shared by the regime, signal, radar and anomaly rules.
//!
//! Every field has a default; any of them can be overridden from the
//! `[thresholds]` configuration section. Values are validated at cycle start.

use crate::domain::error::RadarError;
use crate::ports::config_port::ConfigPort;
use serde::Serialize;

pub const SECTION: &str = "thresholds";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thresholds {
    /// ADX below this is a range-bound market.
    pub adx_trend: f64,
    /// ADX at or above this is a strong trend.
    pub adx_strong: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub max_nan_ratio: f64,
    pub rvol_high: f64,
    pub rvol_low: f64,
    pub breakout_volume: f64,
    /// Single-bar close-to-close move, percent.
    pub abrupt_move_pct: f64,
    pub radar1_rsi_max: f64,
    pub radar2_rsi_min: f64,
    pub radar3_rsi_min: f64,
    pub radar4_rsi_max: f64,
    pub radar5_rsi_low: f64,
    pub radar5_rsi_high: f64,
    pub radar5_min_crossovers: usize,
    pub opportunity_floor: f64,
    pub volatility_multiplier: f64,
    pub correlation_drop: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            adx_trend: 20.0,
            adx_strong: 40.0,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            max_nan_ratio: 0.10,
            rvol_high: 3.0,
            rvol_low: 0.4,
            breakout_volume: 1.5,
            abrupt_move_pct: 5.0,
            radar1_rsi_max: 40.0,
            radar2_rsi_min: 50.0,
            radar3_rsi_min: 60.0,
            radar4_rsi_max: 50.0,
            radar5_rsi_low: 35.0,
            radar5_rsi_high: 65.0,
            radar5_min_crossovers: 2,
            opportunity_floor: 60.0,
            volatility_multiplier: 1.25,
            correlation_drop: 0.3,
        }
    }
}

fn overlay(config: &dyn ConfigPort, key: &str, slot: &mut f64) -> Result<(), RadarError> {
    if let Some(v) = config.get_f64(SECTION, key)? {
        *slot = v;
    }
    Ok(())
}

fn check(ok: bool, key: &str, reason: &str) -> Result<(), RadarError> {
    if ok {
        Ok(())
    } else {
        Err(RadarError::config_invalid(SECTION, key, reason))
    }
}

fn is_rsi(v: f64) -> bool {
    (0.0..=100.0).contains(&v)
}

impl Thresholds {
    /// Defaults overlaid with the `[thresholds]` section, then validated.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, RadarError> {
        let mut t = Thresholds::default();
        overlay(config, "adx_trend", &mut t.adx_trend)?;
        overlay(config, "adx_strong", &mut t.adx_strong)?;
        overlay(config, "rsi_oversold", &mut t.rsi_oversold)?;
        overlay(config, "rsi_overbought", &mut t.rsi_overbought)?;
        overlay(config, "max_nan_ratio", &mut t.max_nan_ratio)?;
        overlay(config, "rvol_high", &mut t.rvol_high)?;
        overlay(config, "rvol_low", &mut t.rvol_low)?;
        overlay(config, "breakout_volume", &mut t.breakout_volume)?;
        overlay(config, "abrupt_move_pct", &mut t.abrupt_move_pct)?;
        overlay(config, "radar1_rsi_max", &mut t.radar1_rsi_max)?;
        overlay(config, "radar2_rsi_min", &mut t.radar2_rsi_min)?;
        overlay(config, "radar3_rsi_min", &mut t.radar3_rsi_min)?;
        overlay(config, "radar4_rsi_max", &mut t.radar4_rsi_max)?;
        overlay(config, "radar5_rsi_low", &mut t.radar5_rsi_low)?;
        overlay(config, "radar5_rsi_high", &mut t.radar5_rsi_high)?;
        overlay(config, "opportunity_floor", &mut t.opportunity_floor)?;
        overlay(config, "volatility_multiplier", &mut t.volatility_multiplier)?;
        overlay(config, "correlation_drop", &mut t.correlation_drop)?;
        if let Some(v) = config.get_usize(SECTION, "radar5_min_crossovers")? {
            t.radar5_min_crossovers = v;
        }
        t.validate()?;
        Ok(t)
    }

    pub fn validate(&self) -> Result<(), RadarError> {
        check(
            self.adx_trend > 0.0 && self.adx_trend < self.adx_strong && self.adx_strong <= 100.0,
            "adx_trend",
            "require 0 < adx_trend < adx_strong <= 100",
        )?;
        // the RSI terms are scaled by the distance from the 50 midline
        check(
            is_rsi(self.rsi_oversold) && is_rsi(self.rsi_overbought) && self.rsi_oversold < 50.0 && self.rsi_overbought > 50.0,
            "rsi_oversold",
            "require 0 <= rsi_oversold < 50 < rsi_overbought <= 100",
        )?;
        check(
            self.max_nan_ratio >= 0.0 && self.max_nan_ratio < 1.0,
            "max_nan_ratio",
            "must be in [0, 1)",
        )?;
        check(
            self.rvol_low > 0.0 && self.rvol_low < 1.0 && self.rvol_high > 1.0,
            "rvol_high",
            "require 0 < rvol_low < 1 < rvol_high",
        )?;
        check(self.breakout_volume > 1.0, "breakout_volume", "must be greater than 1")?;
        check(self.abrupt_move_pct > 0.0, "abrupt_move_pct", "must be positive")?;
        for (key, v) in [
            ("radar1_rsi_max", self.radar1_rsi_max),
            ("radar2_rsi_min", self.radar2_rsi_min),
            ("radar3_rsi_min", self.radar3_rsi_min),
            ("radar4_rsi_max", self.radar4_rsi_max),
        ] {
            check(is_rsi(v), key, "must be in [0, 100]")?;
        }
        check(
            is_rsi(self.radar5_rsi_low) && is_rsi(self.radar5_rsi_high) && self.radar5_rsi_low <= self.radar5_rsi_high,
            "radar5_rsi_low",
            "require 0 <= radar5_rsi_low <= radar5_rsi_high <= 100",
        )?;
        check(
            (1..=10).contains(&self.radar5_min_crossovers),
            "radar5_min_crossovers",
            "must be between 1 and 10",
        )?;
        check(
            self.opportunity_floor > 0.0 && self.opportunity_floor <= 100.0,
            "opportunity_floor",
            "must be in (0, 100]",
        )?;
        check(
            self.volatility_multiplier >= 1.0,
            "volatility_multiplier",
            "must be at least 1",
        )?;
        check(
            self.correlation_drop > 0.0 && self.correlation_drop <= 2.0,
            "correlation_drop",
            "must be in (0, 2]",
        )?;
        Ok(())
    }
}
