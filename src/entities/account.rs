//! Account entity - One credit account per Discord user.
//!
//! Holds the running balance and the `total_used`, `total_returned` and `total_bonus`
//! accumulators. `pending_return` is never stored; it is summed from open borrows on read.
//! The `version` column backs the optimistic concurrency check on every balance update.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord user ID owning this account
    #[sea_orm(unique)]
    pub user_id: String,
    /// Credit granted when the account was created
    pub initial_credit: i64,
    /// Credit currently available for borrowing
    pub current_credit: i64,
    /// Credit consumed by borrows and late penalties
    pub total_used: i64,
    /// Credit given back by returns and time-based accrual
    pub total_returned: i64,
    /// Credit awarded through administrative bonuses
    pub total_bonus: i64,
    /// Start of the accrual interval not yet credited
    pub last_accrual_at: DateTimeUtc,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// Incremented on every balance change
    pub version: i64,
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One account has many ledger entries
    #[sea_orm(has_many = "super::credit_transaction::Entity")]
    Transactions,
    /// One account has many borrows
    #[sea_orm(has_many = "super::borrow::Entity")]
    Borrows,
}

impl Related<super::credit_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::borrow::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Borrows.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Checks the balance identity every mutation must preserve:
    /// `current = initial - used + returned + bonus`.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.current_credit
            == self.initial_credit - self.total_used + self.total_returned + self.total_bonus
    }
}
