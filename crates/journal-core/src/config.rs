//! Configuration loading for the riskdesk engine.
//!
//! The engine itself is constructed from explicit values; this module
//! only covers how a host application sources those values (environment
//! variables or a TOML file). Persistence of journal data stays with the
//! caller.

use crate::types::risk::RiskConfig;
use crate::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Desk-level settings: initial risk inputs plus leverage defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct DeskConfig {
    pub risk: RiskSettings,
    #[serde(default)]
    pub leverage: LeverageDefaults,
}

/// Inputs for deriving the daily risk configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskSettings {
    /// Total trading capital.
    pub capital_total: Decimal,
    /// Daily profit target, percent of capital.
    pub target_daily_pct: Decimal,
}

/// Defaults pre-filled into new leverage session plans.
#[derive(Debug, Clone, Deserialize)]
pub struct LeverageDefaults {
    /// Planned number of levels.
    pub levels: u8,
    /// Profit target per level, percent.
    pub target_per_level_pct: Decimal,
}

impl Default for LeverageDefaults {
    fn default() -> Self {
        Self {
            levels: 3,
            target_per_level_pct: Decimal::new(10, 0),
        }
    }
}

impl DeskConfig {
    /// Load configuration from `RISKDESK_*` environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let desk = Self {
            risk: RiskSettings {
                capital_total: require_decimal("RISKDESK_CAPITAL_TOTAL")?,
                target_daily_pct: require_decimal("RISKDESK_DAILY_TARGET_PCT")?,
            },
            leverage: LeverageDefaults {
                levels: env::var("RISKDESK_LEVERAGE_LEVELS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(LeverageDefaults::default().levels),
                target_per_level_pct: optional_decimal("RISKDESK_LEVERAGE_TARGET_PCT")?
                    .unwrap_or(LeverageDefaults::default().target_per_level_pct),
            },
        };
        info!(
            capital = %desk.risk.capital_total,
            target_pct = %desk.risk.target_daily_pct,
            "Configuration loaded from environment"
        );
        Ok(desk)
    }

    /// Load configuration from a TOML file, with `RISKDESK_*` environment
    /// variables taking precedence.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("RISKDESK").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Derive the daily risk configuration starting at `start_date`.
    pub fn risk_config(&self, start_date: NaiveDate) -> Result<RiskConfig> {
        RiskConfig::derive(self.risk.capital_total, self.risk.target_daily_pct, start_date)
    }

    /// Fixed configuration for tests.
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            risk: RiskSettings {
                capital_total: Decimal::new(10_000, 0),
                target_daily_pct: Decimal::new(2, 0),
            },
            leverage: LeverageDefaults::default(),
        }
    }
}

fn require_decimal(key: &str) -> Result<Decimal> {
    let raw = env::var(key).map_err(|_| Error::Config {
        message: format!("{key} environment variable not set"),
    })?;
    parse_decimal(key, &raw)
}

fn optional_decimal(key: &str) -> Result<Option<Decimal>> {
    match env::var(key) {
        Ok(raw) => parse_decimal(key, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_decimal(key: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| Error::Config {
        message: format!("{key} is not a valid decimal ({raw}): {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_config_derives_risk_config() {
        let desk = DeskConfig::test_config();
        let start = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let risk = desk.risk_config(start).unwrap();

        assert_eq!(risk.stop_gain_amount, Decimal::new(200, 0));
        assert_eq!(risk.start_date, start);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(parse_decimal("RISKDESK_CAPITAL_TOTAL", "ten").is_err());
        assert_eq!(
            parse_decimal("RISKDESK_CAPITAL_TOTAL", "1250.75").unwrap(),
            Decimal::new(125_075, 2)
        );
    }

    #[test]
    fn test_leverage_defaults() {
        let defaults = LeverageDefaults::default();
        assert_eq!(defaults.levels, 3);
        assert_eq!(defaults.target_per_level_pct, Decimal::new(10, 0));
    }
}
