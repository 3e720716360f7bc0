//! Credit transaction entity - The append-only ledger of balance changes.
//!
//! Rows are inserted once and never deleted. The only permitted update is the
//! `status` transition from `pending` to `completed` when a borrow is confirmed.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::Error;

/// Kind of ledger entry.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Credit consumed when equipment is borrowed
    #[sea_orm(string_value = "deduct")]
    Deduct,
    /// Credit given back, on return or through accrual
    #[sea_orm(string_value = "return")]
    Return,
    /// Extra credit consumed for a late return
    #[sea_orm(string_value = "penalty")]
    Penalty,
    /// Administrative award
    #[sea_orm(string_value = "bonus")]
    Bonus,
}

impl TransactionType {
    /// Every variant, in display order.
    pub const ALL: [Self; 4] = [Self::Deduct, Self::Return, Self::Penalty, Self::Bonus];

    /// Lowercase name as stored and as accepted by filters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deduct => "deduct",
            Self::Return => "return",
            Self::Penalty => "penalty",
            Self::Bonus => "bonus",
        }
    }

    /// Whether entries of this type take credit away from the account.
    #[must_use]
    pub const fn is_debit(self) -> bool {
        matches!(self, Self::Deduct | Self::Penalty)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid(format!("unknown transaction type '{s}'")))
    }
}

/// Settlement state of a ledger entry.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Awaiting confirmation
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Settled
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// Credit transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_transactions")]
pub struct Model {
    /// Unique, monotonically increasing identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the account this entry belongs to
    pub account_id: i64,
    /// Kind of entry
    pub transaction_type: TransactionType,
    /// Always positive; the sign is implied by `transaction_type`
    pub amount: i64,
    /// Human-readable reason
    pub reason: String,
    /// When the entry was created
    pub date: DateTimeUtc,
    /// Settlement state
    pub status: TransactionStatus,
    /// Borrow this entry is tied to, if any
    pub borrow_id: Option<i64>,
    /// Equipment name for borrow-related entries
    pub equipment_name: Option<String>,
    /// Due date, set on `deduct` entries only
    pub expected_return: Option<DateTimeUtc>,
    /// Note from the administrator, set on `bonus` entries only
    pub admin_note: Option<String>,
}

/// Defines relationships between CreditTransaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
