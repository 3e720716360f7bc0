//! Core business logic - framework-agnostic credit ledger operations.
//!
//! Nothing in here knows about Discord. The bot layer calls into [`service`], which
//! serializes writes per account and delegates to the operation modules.

/// Account creation, lookup, snapshots and balance updates
pub mod account;
/// Time-based credit restoration
pub mod accrual;
/// Borrow queries and derived overdue state
pub mod borrow;
/// Equipment prices
pub mod catalog;
/// Paginated, filterable transaction history
pub mod history;
/// Borrow, confirm, return and bonus operations
pub mod ledger;
/// Per-account mutual exclusion
pub mod locks;
/// Text formatting for the presentation layer
pub mod report;
/// Background accrual loop
pub mod scheduler;
/// The `CreditLedger` interface and its database-backed implementation
pub mod service;
/// Monthly statistics
pub mod stats;
