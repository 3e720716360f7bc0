//! Borrow entity - One loan of one piece of equipment.
//!
//! Only terminal outcomes are stored in `status`; "overdue" is derived at read time
//! from `expected_return_date` and the current time (see `core::borrow`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored lifecycle state of a borrow.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum BorrowStatus {
    /// Equipment is out
    #[sea_orm(string_value = "borrowed")]
    Borrowed,
    /// Returned on or before the due date
    #[sea_orm(string_value = "returned")]
    Returned,
    /// Returned after the due date
    #[sea_orm(string_value = "returned_late")]
    ReturnedLate,
}

/// Borrow database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "borrows")]
pub struct Model {
    /// Unique identifier for the borrow
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the borrowing account
    pub account_id: i64,
    /// Caller-supplied identifier of the equipment item
    pub equipment_id: String,
    /// Display name of the equipment item
    pub equipment_name: String,
    /// When the equipment was taken
    pub borrow_date: DateTimeUtc,
    /// When the equipment is due back
    pub expected_return_date: DateTimeUtc,
    /// When the equipment came back, None while out
    pub actual_return_date: Option<DateTimeUtc>,
    /// Credit charged by the `deduct` entry
    pub credit_used: i64,
    /// Part of `credit_used` already given back through accrual
    pub credit_restored: i64,
    /// Stored lifecycle state
    pub status: BorrowStatus,
}

/// Defines relationships between Borrow and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each borrow belongs to one account
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
