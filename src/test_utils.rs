//! Shared test utilities for the credit ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test accounts and borrows with sensible defaults.

use crate::{
    core::{
        account,
        ledger::{self, BorrowReceipt, BorrowRequest},
    },
    entities,
    errors::Result,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test account with 100 credits.
pub async fn create_test_account(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<entities::account::Model> {
    account::create_account(db, user_id, 100, Utc::now()).await
}

/// Creates a test account with a custom starting credit.
pub async fn create_custom_account(
    db: &DatabaseConnection,
    user_id: &str,
    initial_credit: i64,
) -> Result<entities::account::Model> {
    account::create_account(db, user_id, initial_credit, Utc::now()).await
}

/// Creates an account whose accrual clock starts at `at`.
pub async fn account_at(
    db: &DatabaseConnection,
    user_id: &str,
    initial_credit: i64,
    at: DateTime<Utc>,
) -> Result<entities::account::Model> {
    account::create_account(db, user_id, initial_credit, at).await
}

/// Borrows `equipment_name` at `at`, due back at `due`.
pub async fn borrow_at(
    db: &DatabaseConnection,
    account_id: i64,
    equipment_name: &str,
    cost: i64,
    at: DateTime<Utc>,
    due: DateTime<Utc>,
) -> Result<BorrowReceipt> {
    ledger::record_borrow(
        db,
        account_id,
        BorrowRequest {
            equipment_id: String::new(),
            equipment_name: equipment_name.to_string(),
            expected_return_date: due,
            cost,
        },
        at,
    )
    .await
}

/// Borrows a test item now, due back in seven days.
pub async fn create_test_borrow(
    db: &DatabaseConnection,
    account_id: i64,
    cost: i64,
) -> Result<BorrowReceipt> {
    let now = Utc::now();
    borrow_at(db, account_id, "Test Equipment", cost, now, now + Duration::days(7)).await
}

/// Sets up a complete test environment with one 100-credit account.
/// Returns (db, account) for common test scenarios.
pub async fn setup_with_account() -> Result<(DatabaseConnection, entities::account::Model)> {
    let db = setup_test_db().await?;
    let account = create_test_account(&db, "test_user").await?;
    Ok((db, account))
}
