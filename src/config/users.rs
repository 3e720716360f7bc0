//! Administrator configuration loaded from environment variables.
//!
//! `LEDGER_ADMIN_IDS` holds a comma-separated list of Discord user IDs allowed to
//! run administrative commands (bonus awards, borrow confirmation, manual accrual).

use std::collections::HashSet;

/// Parses a comma-separated list of user IDs, ignoring blanks and surrounding whitespace.
#[must_use]
pub fn parse_admin_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Reads the administrator set from `LEDGER_ADMIN_IDS`. Empty when unset.
#[must_use]
pub fn get_admin_ids() -> HashSet<String> {
    std::env::var("LEDGER_ADMIN_IDS")
        .map(|raw| parse_admin_ids(&raw))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_ids() {
        let ids = parse_admin_ids(" 123, 456 ,,789 ");
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("123"));
        assert!(ids.contains("456"));
        assert!(ids.contains("789"));
    }

    #[test]
    fn test_parse_admin_ids_empty() {
        assert!(parse_admin_ids("").is_empty());
        assert!(parse_admin_ids(" , ").is_empty());
    }
}
