//! Credit policy loading from config.toml
//!
//! The `[policy]` table tunes the ledger rules (penalty rate, accrual schedule,
//! bonus ceiling, loan length, page limits). The `[[equipment]]` list is the price
//! catalog borrowers pick from, and the optional `[[accounts]]` list seeds accounts with
//! a custom starting credit on first run. Every policy key has a default, so an empty
//! or missing file yields a working configuration.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{collections::HashSet, path::Path};
use tracing::{debug, info};

/// Upper bound accepted for `max_loan_days` (about a century).
pub const MAX_LOAN_DAYS_LIMIT: i64 = 36_500;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Ledger rules
    #[serde(default)]
    pub policy: CreditPolicy,
    /// Accounts to create on startup if missing
    #[serde(default)]
    pub accounts: Vec<AccountSeed>,
    /// Lendable equipment and its credit cost
    #[serde(default)]
    pub equipment: Vec<EquipmentItem>,
}

/// Tunable ledger rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreditPolicy {
    /// Starting credit for accounts created on demand
    pub default_initial_credit: i64,
    /// Credit charged per whole day of lateness
    pub penalty_per_day: i64,
    /// Credit restored per completed accrual period
    pub accrual_amount: i64,
    /// Length of one accrual period in days
    pub accrual_period_days: i64,
    /// Upper bound for bonuses as a percentage of `initial_credit`; `None` means uncapped
    pub bonus_ceiling_percent: Option<i64>,
    /// Longest loan a borrower may ask for, in days
    pub max_loan_days: i64,
    /// Largest page size `list_history` accepts
    pub history_max_page_size: u64,
    /// How often the background scheduler runs accrual
    pub accrual_check_interval_minutes: u64,
}

impl Default for CreditPolicy {
    fn default() -> Self {
        Self {
            default_initial_credit: 100,
            penalty_per_day: 5,
            accrual_amount: 5,
            accrual_period_days: 7,
            bonus_ceiling_percent: None,
            max_loan_days: 90,
            history_max_page_size: 50,
            accrual_check_interval_minutes: 60,
        }
    }
}

impl CreditPolicy {
    /// Rejects values that would break the ledger arithmetic.
    pub fn validate(&self) -> Result<()> {
        if self.default_initial_credit < 0 {
            return Err(Error::Config {
                message: "default_initial_credit must not be negative".to_string(),
            });
        }
        if self.penalty_per_day < 0 || self.accrual_amount < 0 {
            return Err(Error::Config {
                message: "penalty_per_day and accrual_amount must not be negative".to_string(),
            });
        }
        if self.accrual_period_days <= 0 {
            return Err(Error::Config {
                message: "accrual_period_days must be positive".to_string(),
            });
        }
        if matches!(self.bonus_ceiling_percent, Some(p) if p < 100) {
            return Err(Error::Config {
                message: "bonus_ceiling_percent must be at least 100".to_string(),
            });
        }
        if !(1..=MAX_LOAN_DAYS_LIMIT).contains(&self.max_loan_days) {
            return Err(Error::Config {
                message: format!("max_loan_days must be between 1 and {MAX_LOAN_DAYS_LIMIT}"),
            });
        }
        if self.history_max_page_size == 0 || self.accrual_check_interval_minutes == 0 {
            return Err(Error::Config {
                message: "history_max_page_size and accrual_check_interval_minutes must be positive"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Highest balance a bonus may lift an account to, if capped.
    ///
    /// Saturates at `i64::MAX` instead of overflowing.
    #[must_use]
    pub fn bonus_ceiling(&self, initial_credit: i64) -> Option<i64> {
        self.bonus_ceiling_percent.map(|percent| {
            let ceiling = i128::from(initial_credit) * i128::from(percent) / 100;
            i64::try_from(ceiling).unwrap_or(i64::MAX)
        })
    }
}

/// An account to seed at startup
#[derive(Debug, Deserialize, Clone)]
pub struct AccountSeed {
    /// Discord user ID
    pub user_id: String,
    /// Starting credit; falls back to the policy default
    pub initial_credit: Option<i64>,
}

/// A lendable piece of equipment
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct EquipmentItem {
    /// Inventory identifier, unique within the catalog
    pub id: String,
    /// Display name
    pub name: String,
    /// Credit deducted when borrowed
    pub cost: i64,
}

/// Rejects catalog entries that are blank, free or listed twice.
pub fn validate_equipment(items: &[EquipmentItem]) -> Result<()> {
    let mut seen = HashSet::new();
    for item in items {
        if item.id.trim().is_empty() || item.name.trim().is_empty() {
            return Err(Error::Config {
                message: "equipment entries need a non-empty id and name".to_string(),
            });
        }
        if item.cost <= 0 {
            return Err(Error::Config {
                message: format!("equipment {} must cost at least 1 credit", item.id),
            });
        }
        if !seen.insert(item.id.trim().to_lowercase()) {
            return Err(Error::Config {
                message: format!("equipment id {} is listed twice", item.id),
            });
        }
    }
    Ok(())
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A policy value is out of range
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {path_ref:?}");
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses and validates configuration text.
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.policy.validate()?;
    validate_equipment(&config.equipment)?;
    Ok(config)
}

/// Loads configuration from `LEDGER_CONFIG` or `./config.toml`.
///
/// A missing file is not an error: the default policy is used with no seeds.
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var("LEDGER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    if !Path::new(&path).exists() {
        info!("No config file at {path}, using default credit policy");
        return Ok(Config::default());
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [policy]
            default_initial_credit = 120
            penalty_per_day = 10
            accrual_amount = 3
            accrual_period_days = 14
            bonus_ceiling_percent = 150

            [[accounts]]
            user_id = "1001"
            initial_credit = 200

            [[accounts]]
            user_id = "1002"

            [[equipment]]
            id = "CAM-01"
            name = "Camera"
            cost = 15
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.policy.default_initial_credit, 120);
        assert_eq!(config.policy.penalty_per_day, 10);
        assert_eq!(config.policy.accrual_amount, 3);
        assert_eq!(config.policy.accrual_period_days, 14);
        assert_eq!(config.policy.bonus_ceiling(200), Some(300));
        // Unspecified keys keep their defaults
        assert_eq!(config.policy.history_max_page_size, 50);

        assert_eq!(config.equipment.len(), 1);
        assert_eq!(config.equipment[0].cost, 15);

        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.accounts[0].initial_credit, Some(200));
        assert_eq!(config.accounts[1].initial_credit, None);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.policy, CreditPolicy::default());
        assert!(config.accounts.is_empty());
        assert_eq!(config.policy.bonus_ceiling(100), None);
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let result = parse_config("[policy]\naccrual_period_days = 0\n");
        assert!(matches!(result, Err(Error::Config { .. })));

        let result = parse_config("[policy]\nbonus_ceiling_percent = 50\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = parse_config("[policy\npenalty_per_day = 5");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_bonus_ceiling_saturates() {
        let policy = CreditPolicy {
            bonus_ceiling_percent: Some(150),
            ..CreditPolicy::default()
        };
        assert_eq!(policy.bonus_ceiling(100), Some(150));
        assert_eq!(policy.bonus_ceiling(i64::MAX), Some(i64::MAX));

        let policy = CreditPolicy {
            bonus_ceiling_percent: Some(i64::MAX),
            ..CreditPolicy::default()
        };
        assert_eq!(policy.bonus_ceiling(1_000), Some(i64::MAX));
    }

    #[test]
    fn test_max_loan_days_bounds() {
        assert_eq!(CreditPolicy::default().max_loan_days, 90);

        let result = parse_config("[policy]\nmax_loan_days = 0\n");
        assert!(matches!(result, Err(Error::Config { .. })));

        let result = parse_config("[policy]\nmax_loan_days = 99999999\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_invalid_equipment_rejected() {
        let free = "[[equipment]]\nid = \"T1\"\nname = \"Tripod\"\ncost = 0\n";
        assert!(matches!(parse_config(free), Err(Error::Config { .. })));

        let blank = "[[equipment]]\nid = \" \"\nname = \"Tripod\"\ncost = 5\n";
        assert!(matches!(parse_config(blank), Err(Error::Config { .. })));

        let twice = "[[equipment]]\nid = \"T1\"\nname = \"Tripod\"\ncost = 5\n\
                     [[equipment]]\nid = \"t1\"\nname = \"Other tripod\"\ncost = 6\n";
        assert!(matches!(parse_config(twice), Err(Error::Config { .. })));
    }
}
