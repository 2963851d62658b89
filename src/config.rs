//! Ledger settings, loaded from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file) is a valid configuration.

use std::{fs, path::Path, time::Duration};

use rust_decimal::{Decimal, dec};
use serde::{Deserialize, Serialize};

use crate::domain::Paise;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Percentage withheld as TDS from bonus credits.
    pub bonus_tds_percentage: Decimal,
    /// Allowed absolute gap between booked inventory cost and bulk purchase cost.
    pub ledger_tolerance_paise: Paise,
    pub inventory_reconciliation: JobSettings,
    pub snapshot_audit: JobSettings,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            bonus_tds_percentage: dec!(10),
            ledger_tolerance_paise: Paise::new(100),
            inventory_reconciliation: JobSettings { timeout_secs: 300 },
            snapshot_audit: JobSettings { timeout_secs: 600 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSettings {
    pub timeout_secs: u64,
}

impl JobSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LedgerConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bonus_tds_percentage.is_sign_negative()
            || self.bonus_tds_percentage >= Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::Invalid(format!(
                "bonus_tds_percentage must be in 0..100, got {}",
                self.bonus_tds_percentage
            )));
        }
        if self.ledger_tolerance_paise.is_negative() {
            return Err(ConfigError::Invalid(format!(
                "ledger_tolerance_paise must not be negative, got {}",
                self.ledger_tolerance_paise
            )));
        }
        for (name, job) in [
            ("inventory_reconciliation", &self.inventory_reconciliation),
            ("snapshot_audit", &self.snapshot_audit),
        ] {
            if job.timeout_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{name}.timeout_secs must be positive"
                )));
            }
        }
        Ok(())
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<LedgerConfig, ConfigError> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading ledger configuration from {:?}", path_ref);
    let contents = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
        path: path_ref.display().to_string(),
        source,
    })?;
    LedgerConfig::from_toml_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = LedgerConfig::from_toml_str("").unwrap();
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let config = LedgerConfig::from_toml_str(
            r#"
            bonus_tds_percentage = "7.5"

            [snapshot_audit]
            timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.bonus_tds_percentage, dec!(7.5));
        assert_eq!(config.snapshot_audit.timeout(), Duration::from_secs(30));
        assert_eq!(config.ledger_tolerance_paise, Paise::new(100));
        assert_eq!(config.inventory_reconciliation.timeout_secs, 300);
    }

    #[test]
    fn rejects_tds_of_one_hundred_percent() {
        let err = LedgerConfig::from_toml_str(r#"bonus_tds_percentage = "100""#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = LedgerConfig::from_toml_str("[inventory_reconciliation]\ntimeout_secs = 0")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
