//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions that are not commands
//! themselves, currently slash command autocomplete.

/// Autocomplete handlers for equipment, history filters, borrow filters and open borrows
pub mod autocomplete;
