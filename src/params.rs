// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Delivery Economics Engine - Tunable Parameters
//
// Company rules that price a delivery. Every constant the cost model uses
// lives here so a deployment can override it from a JSON file.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// CostRates
// ---------------------------------------------------------------------------

/// Rates and thresholds applied to every order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostRates {
    /// Fuel cost per km on any route.
    pub base_fuel_rate: Decimal,
    /// Extra fuel cost per km when traffic is high.
    pub high_traffic_surcharge: Decimal,
    /// Flat penalty for a late delivery.
    pub late_penalty: Decimal,
    /// Share of order value paid as bonus for on-time high-value orders.
    pub bonus_rate: Decimal,
    /// Orders strictly above this value are high-value.
    pub high_value_threshold: Decimal,
    /// Seconds a delivery may overrun its base time before it is late.
    pub grace_window_secs: Decimal,
    /// Delivery offset used when the projected timestamp cannot be computed.
    pub fallback_delivery_minutes: i64,
    /// Transit-time multiplier for high traffic.
    pub high_traffic_multiplier: Decimal,
    /// Transit-time multiplier for medium traffic.
    pub medium_traffic_multiplier: Decimal,
}

impl Default for CostRates {
    fn default() -> Self {
        Self {
            base_fuel_rate: dec!(5),
            high_traffic_surcharge: dec!(2),
            late_penalty: dec!(50),
            bonus_rate: dec!(0.10),
            high_value_threshold: dec!(1000),
            grace_window_secs: dec!(600),
            fallback_delivery_minutes: 30,
            high_traffic_multiplier: dec!(1.5),
            medium_traffic_multiplier: dec!(1.2),
        }
    }
}

impl CostRates {
    /// Reject settings that would make the cost rules meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("base_fuel_rate", self.base_fuel_rate),
            ("high_traffic_surcharge", self.high_traffic_surcharge),
            ("late_penalty", self.late_penalty),
            ("bonus_rate", self.bonus_rate),
            ("high_value_threshold", self.high_value_threshold),
            ("grace_window_secs", self.grace_window_secs),
        ];
        for (field, value) in non_negative {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must not be negative, got {}", value),
                });
            }
        }
        if self.high_traffic_multiplier < Decimal::ONE {
            return Err(ConfigError::Invalid {
                field: "high_traffic_multiplier",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.medium_traffic_multiplier < Decimal::ONE {
            return Err(ConfigError::Invalid {
                field: "medium_traffic_multiplier",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.fallback_delivery_minutes < 0 {
            return Err(ConfigError::Invalid {
                field: "fallback_delivery_minutes",
                reason: "must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rates: CostRates,
    /// Number of runs returned by the historical trend view.
    pub trend_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rates: CostRates::default(),
            trend_window: 10,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON document; missing fields keep defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.rates.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
