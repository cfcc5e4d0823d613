//! Service configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults.
//!
//! | Variable                   | Default                      |
//! |----------------------------|------------------------------|
//! | `TALLY_DATABASE_PATH`      | `<platform data dir>/tally.db` |
//! | `TALLY_DB_MAX_CONNECTIONS` | `5`                          |
//! | `TALLY_TAX_RATE`           | `0.08`                       |
//! | `TALLY_RENTAL_PERIOD_DAYS` | `14`                         |
//! | `TALLY_LATE_FEE_RATE`      | `0.10`                       |
//! | `TALLY_COUPON_POLICY`      | `lenient`                    |
//! | `TALLY_LOW_STOCK_THRESHOLD`| `10`                         |

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use tally_core::types::Rate;
use tally_core::{CouponPolicy, Policy};

/// Back office configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size for the storage backend
    pub db_max_connections: u32,

    /// Tax rate, rental period, late fee rate, coupon policy, thresholds
    pub policy: Policy,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the raw value of
    /// a variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Policy::default();

        let database_path = match lookup("TALLY_DATABASE_PATH").filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_database_path(),
        };

        let db_max_connections: u32 = parse_or(&lookup, "TALLY_DB_MAX_CONNECTIONS", 5)?;
        if db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("TALLY_DB_MAX_CONNECTIONS".to_string()));
        }

        let tax_rate = rate_or(&lookup, "TALLY_TAX_RATE", defaults.tax_rate)?;
        let late_fee_rate = rate_or(&lookup, "TALLY_LATE_FEE_RATE", defaults.late_fee_rate)?;

        let rental_period_days: i64 = parse_or(&lookup, "TALLY_RENTAL_PERIOD_DAYS", defaults.rental_period_days)?;
        if rental_period_days < 1 {
            return Err(ConfigError::InvalidValue("TALLY_RENTAL_PERIOD_DAYS".to_string()));
        }

        let low_stock_threshold: i64 = parse_or(&lookup, "TALLY_LOW_STOCK_THRESHOLD", defaults.low_stock_threshold)?;
        if low_stock_threshold < 0 {
            return Err(ConfigError::InvalidValue("TALLY_LOW_STOCK_THRESHOLD".to_string()));
        }

        let coupon_policy = match lookup("TALLY_COUPON_POLICY") {
            Some(raw) => raw
                .parse::<CouponPolicy>()
                .map_err(|_| ConfigError::InvalidValue("TALLY_COUPON_POLICY".to_string()))?,
            None => defaults.coupon_policy,
        };

        let policy = defaults
            .with_tax_rate(tax_rate)
            .with_late_fee_rate(late_fee_rate)
            .with_rental_period_days(rental_period_days)
            .with_low_stock_threshold(low_stock_threshold)
            .with_coupon_policy(coupon_policy);

        Ok(ServiceConfig {
            database_path,
            db_max_connections,
            policy,
        })
    }
}

/// Platform data directory for the database.
///
/// - **macOS**: `~/Library/Application Support/com.tally.backoffice/tally.db`
/// - **Windows**: `%APPDATA%\tally\backoffice\data\tally.db`
/// - **Linux**: `~/.local/share/backoffice/tally.db`
///
/// Falls back to `./tally.db` when no home directory can be determined.
pub fn default_database_path() -> PathBuf {
    ProjectDirs::from("com", "tally", "backoffice")
        .map(|dirs| dirs.data_dir().join("tally.db"))
        .unwrap_or_else(|| PathBuf::from("tally.db"))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn rate_or<F>(lookup: &F, key: &str, default: Rate) -> Result<Rate, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => Rate::parse_fraction(&raw).map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.policy, Policy::default());
        assert_eq!(config.db_max_connections, 5);
        assert!(config.database_path.ends_with("tally.db"));
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("TALLY_DATABASE_PATH", "/tmp/store.db"),
            ("TALLY_TAX_RATE", "0.0825"),
            ("TALLY_LATE_FEE_RATE", "0.05"),
            ("TALLY_RENTAL_PERIOD_DAYS", "7"),
            ("TALLY_COUPON_POLICY", "strict"),
            ("TALLY_LOW_STOCK_THRESHOLD", "3"),
            ("TALLY_DB_MAX_CONNECTIONS", "2"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/store.db"));
        assert_eq!(config.policy.tax_rate.bps(), 825);
        assert_eq!(config.policy.late_fee_rate.bps(), 500);
        assert_eq!(config.policy.rental_period_days, 7);
        assert_eq!(config.policy.coupon_policy, CouponPolicy::Strict);
        assert_eq!(config.policy.low_stock_threshold, 3);
        assert_eq!(config.db_max_connections, 2);
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("TALLY_TAX_RATE", "eight"),
            ("TALLY_TAX_RATE", "1.5"),
            ("TALLY_RENTAL_PERIOD_DAYS", "0"),
            ("TALLY_COUPON_POLICY", "sometimes"),
            ("TALLY_DB_MAX_CONNECTIONS", "0"),
        ] {
            let err = ServiceConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue(ref k) if k == key), "{key}={value}");
        }
    }
}
