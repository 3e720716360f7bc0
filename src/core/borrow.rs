//! Borrow queries and derived lifecycle state.
//!
//! The stored status only records terminal outcomes. Whether an open borrow is overdue
//! depends on the clock, so it is computed here on every read and never persisted.

use crate::{
    entities::{Borrow, BorrowStatus, borrow},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Effective state of a borrow at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BorrowState {
    /// Out and not yet due
    Borrowed,
    /// Out and past its due date
    Overdue,
    /// Came back on time
    Returned,
    /// Came back late
    ReturnedLate,
}

impl BorrowState {
    /// Lowercase name used in filters and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Borrowed => "borrowed",
            Self::Overdue => "overdue",
            Self::Returned => "returned",
            Self::ReturnedLate => "returned_late",
        }
    }
}

impl fmt::Display for BorrowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which borrows `list_borrows` should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorrowFilter {
    /// Every borrow
    #[default]
    All,
    /// Only borrows currently in this effective state
    State(BorrowState),
}

impl BorrowFilter {
    /// Whether a borrow in `state` passes this filter.
    #[must_use]
    pub fn matches(self, state: BorrowState) -> bool {
        match self {
            Self::All => true,
            Self::State(wanted) => wanted == state,
        }
    }
}

impl FromStr for BorrowFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "borrowed" => Ok(Self::State(BorrowState::Borrowed)),
            "overdue" => Ok(Self::State(BorrowState::Overdue)),
            "returned" => Ok(Self::State(BorrowState::Returned)),
            "returned_late" => Ok(Self::State(BorrowState::ReturnedLate)),
            other => Err(Error::invalid(format!("unknown borrow filter '{other}'"))),
        }
    }
}

/// A borrow together with its state and lateness as of the query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BorrowView {
    /// The stored borrow row
    pub borrow: borrow::Model,
    /// Effective state at query time
    pub state: BorrowState,
    /// Whole days past due, measured to the return date or to now while out
    pub days_overdue: i64,
}

/// Whole days between `expected` and `actual`, floored, never negative.
#[must_use]
pub fn days_overdue(expected: DateTime<Utc>, actual: DateTime<Utc>) -> i64 {
    (actual - expected).num_days().max(0)
}

/// Computes the effective state of a borrow at `now`.
#[must_use]
pub fn effective_state(borrow: &borrow::Model, now: DateTime<Utc>) -> BorrowState {
    match borrow.status {
        BorrowStatus::Returned => BorrowState::Returned,
        BorrowStatus::ReturnedLate => BorrowState::ReturnedLate,
        BorrowStatus::Borrowed if now > borrow.expected_return_date => BorrowState::Overdue,
        BorrowStatus::Borrowed => BorrowState::Borrowed,
    }
}

/// Builds the read-side view of a borrow at `now`.
#[must_use]
pub fn view_borrow(borrow: borrow::Model, now: DateTime<Utc>) -> BorrowView {
    let until = borrow.actual_return_date.unwrap_or(now);
    BorrowView {
        state: effective_state(&borrow, now),
        days_overdue: days_overdue(borrow.expected_return_date, until),
        borrow,
    }
}

/// Finds a borrow by its ID.
pub async fn get_borrow_by_id<C>(db: &C, borrow_id: i64) -> Result<Option<borrow::Model>>
where
    C: ConnectionTrait,
{
    Borrow::find_by_id(borrow_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Borrows of an account still in the `borrowed` state, oldest first.
pub async fn get_open_borrows<C>(db: &C, account_id: i64) -> Result<Vec<borrow::Model>>
where
    C: ConnectionTrait,
{
    Borrow::find()
        .filter(borrow::Column::AccountId.eq(account_id))
        .filter(borrow::Column::Status.eq(BorrowStatus::Borrowed))
        .order_by_asc(borrow::Column::BorrowDate)
        .order_by_asc(borrow::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists an account's borrows, newest first, keeping those whose state at `now`
/// passes `filter`.
pub async fn list_borrows(
    db: &DatabaseConnection,
    account_id: i64,
    filter: BorrowFilter,
    now: DateTime<Utc>,
) -> Result<Vec<BorrowView>> {
    let txn = db.begin().await?;
    crate::core::account::get_account(&txn, account_id).await?;
    let borrows = Borrow::find()
        .filter(borrow::Column::AccountId.eq(account_id))
        .order_by_desc(borrow::Column::BorrowDate)
        .order_by_desc(borrow::Column::Id)
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(borrows
        .into_iter()
        .map(|b| view_borrow(b, now))
        .filter(|view| filter.matches(view.state))
        .collect())
}
