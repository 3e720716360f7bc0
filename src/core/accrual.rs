//! Time-based credit restoration.
//!
//! Every completed accrual period ("5 credits per 7 days" by default) gives back part of
//! the credit held by open borrows that are still within their loan window. The account's
//! `last_accrual_at` only advances by whole periods, so the fractional remainder carries
//! over and running the accrual twice inside one period credits nothing the second time.

use crate::{
    config::policy::CreditPolicy,
    core::{
        account::{self, BalanceChange},
        borrow::get_open_borrows,
        ledger::insert_accrual_entry,
    },
    entities::{account as account_entity, credit_transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Result of one accrual run for one account.
#[derive(Debug, Clone)]
pub struct AccrualOutcome {
    /// Account that was processed
    pub account_id: i64,
    /// Whole periods consumed
    pub periods: i64,
    /// Credit restored, possibly less than `periods * accrual_amount`
    pub amount: i64,
    /// The `return` entry, absent when nothing was eligible
    pub transaction: Option<credit_transaction::Model>,
    /// Account after the run
    pub account: account_entity::Model,
}

/// Number of whole accrual periods between `last` and `now`.
#[must_use]
pub fn elapsed_periods(last: DateTime<Utc>, now: DateTime<Utc>, period_days: i64) -> i64 {
    if period_days <= 0 || now <= last {
        return 0;
    }
    (now - last).num_days() / period_days
}

/// Runs accrual for one account at `now`.
///
/// Returns `Ok(None)` when no whole period has elapsed since the last run. Otherwise the
/// periods are consumed even if no open borrow is eligible for restoration.
pub async fn accrue_time_based_return(
    db: &DatabaseConnection,
    account_id: i64,
    policy: &CreditPolicy,
    now: DateTime<Utc>,
) -> Result<Option<AccrualOutcome>> {
    let txn = db.begin().await?;
    let account = account::get_account(&txn, account_id).await?;

    let periods = elapsed_periods(account.last_accrual_at, now, policy.accrual_period_days);
    if periods == 0 {
        debug!(account_id, "No full accrual period elapsed");
        return Ok(None);
    }

    let advanced_to = Duration::try_days(periods * policy.accrual_period_days)
        .and_then(|span| account.last_accrual_at.checked_add_signed(span))
        .ok_or_else(|| Error::invalid("accrual interval out of range"))?;

    // Only borrows still inside their loan window earn restoration.
    let eligible: Vec<_> = get_open_borrows(&txn, account_id)
        .await?
        .into_iter()
        .filter(|b| b.expected_return_date >= now && b.credit_used > b.credit_restored)
        .collect();
    let outstanding: i64 = eligible
        .iter()
        .map(|b| b.credit_used - b.credit_restored)
        .sum();
    let amount = (periods * policy.accrual_amount).min(outstanding);

    let mut remaining = amount;
    for borrow in eligible {
        if remaining == 0 {
            break;
        }
        let share = remaining.min(borrow.credit_used - borrow.credit_restored);
        let restored = borrow.credit_restored + share;
        let mut active: crate::entities::borrow::ActiveModel = borrow.into();
        active.credit_restored = Set(restored);
        active.update(&txn).await?;
        remaining -= share;
    }

    let transaction = if amount > 0 {
        Some(insert_accrual_entry(&txn, account_id, amount, periods, now).await?)
    } else {
        None
    };

    let account = account::apply_balance_change(
        &txn,
        &account,
        BalanceChange {
            returned: amount,
            last_accrual_at: Some(advanced_to),
            ..Default::default()
        },
    )
    .await?;

    txn.commit().await?;

    info!(
        account_id,
        periods,
        amount,
        balance = account.current_credit,
        "Applied time-based credit restoration"
    );

    Ok(Some(AccrualOutcome {
        account_id,
        periods,
        amount,
        transaction,
        account,
    }))
}
