//! Ledger business logic - The mutating operations on a credit account.
//!
//! Borrowing deducts credit and opens a borrow. Returning refunds what the borrow still
//! holds and, when late, charges a per-day penalty as a separate entry. Bonuses are
//! administrative awards. Each operation runs in a single database transaction: the
//! ledger entries, the borrow row and the account balance are committed together or
//! not at all.

use crate::{
    config::policy::CreditPolicy,
    core::{
        account::{self, BalanceChange},
        borrow::{days_overdue, get_borrow_by_id},
    },
    entities::{
        BorrowStatus, CreditTransaction, TransactionStatus, TransactionType, account as account_entity,
        borrow, credit_transaction,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{info, warn};

/// What is being borrowed, until when, and at what cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowRequest {
    /// Identifier of the equipment item
    pub equipment_id: String,
    /// Display name of the equipment item
    pub equipment_name: String,
    /// When the item is due back
    pub expected_return_date: DateTime<Utc>,
    /// Credit to deduct
    pub cost: i64,
}

/// Result of [`record_borrow`].
#[derive(Debug, Clone)]
pub struct BorrowReceipt {
    /// The newly opened borrow
    pub borrow: borrow::Model,
    /// The pending `deduct` entry
    pub transaction: credit_transaction::Model,
    /// Account after the deduction
    pub account: account_entity::Model,
}

/// Result of [`record_return`].
#[derive(Debug, Clone)]
pub struct ReturnReceipt {
    /// The closed borrow
    pub borrow: borrow::Model,
    /// The `return` entry, absent when accrual already restored the whole cost
    pub refund: Option<credit_transaction::Model>,
    /// The `penalty` entry for a late return
    pub penalty: Option<credit_transaction::Model>,
    /// Whole days the return was late
    pub days_overdue: i64,
    /// Account after refund and penalty
    pub account: account_entity::Model,
}

/// Result of [`record_bonus`].
#[derive(Debug, Clone)]
pub struct BonusReceipt {
    /// The `bonus` entry; its amount is what was actually credited
    pub transaction: credit_transaction::Model,
    /// Amount the administrator asked for
    pub requested: i64,
    /// Account after the award
    pub account: account_entity::Model,
}

/// Field values for a new ledger entry.
struct NewEntry {
    account_id: i64,
    transaction_type: TransactionType,
    amount: i64,
    reason: String,
    date: DateTime<Utc>,
    status: TransactionStatus,
    borrow_id: Option<i64>,
    equipment_name: Option<String>,
    expected_return: Option<DateTime<Utc>>,
    admin_note: Option<String>,
}

impl NewEntry {
    fn completed(
        account_id: i64,
        transaction_type: TransactionType,
        amount: i64,
        reason: String,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            transaction_type,
            amount,
            reason,
            date,
            status: TransactionStatus::Completed,
            borrow_id: None,
            equipment_name: None,
            expected_return: None,
            admin_note: None,
        }
    }

    fn for_borrow(mut self, borrow: &borrow::Model) -> Self {
        self.borrow_id = Some(borrow.id);
        self.equipment_name = Some(borrow.equipment_name.clone());
        self
    }
}

/// Appends a ledger entry. Amounts must be positive.
async fn insert_entry<C>(db: &C, entry: NewEntry) -> Result<credit_transaction::Model>
where
    C: ConnectionTrait,
{
    if entry.amount <= 0 {
        return Err(Error::invalid(format!(
            "ledger amounts must be positive, got {}",
            entry.amount
        )));
    }

    let model = credit_transaction::ActiveModel {
        account_id: Set(entry.account_id),
        transaction_type: Set(entry.transaction_type),
        amount: Set(entry.amount),
        reason: Set(entry.reason),
        date: Set(entry.date),
        status: Set(entry.status),
        borrow_id: Set(entry.borrow_id),
        equipment_name: Set(entry.equipment_name),
        expected_return: Set(entry.expected_return),
        admin_note: Set(entry.admin_note),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Records a credit entry restoring `amount` through time-based accrual.
pub(crate) async fn insert_accrual_entry<C>(
    db: &C,
    account_id: i64,
    amount: i64,
    periods: i64,
    at: DateTime<Utc>,
) -> Result<credit_transaction::Model>
where
    C: ConnectionTrait,
{
    insert_entry(
        db,
        NewEntry::completed(
            account_id,
            TransactionType::Return,
            amount,
            format!("Time-based credit restoration ({periods} period(s))"),
            at,
        ),
    )
    .await
}

/// Due date of a loan lasting `loan_days` from `at`.
///
/// Fails with `InvalidArgument` unless `loan_days` is within `1..=policy.max_loan_days`.
pub fn due_date(
    at: DateTime<Utc>,
    loan_days: i64,
    policy: &CreditPolicy,
) -> Result<DateTime<Utc>> {
    if loan_days <= 0 || loan_days > policy.max_loan_days {
        return Err(Error::invalid(format!(
            "loan length must be between 1 and {} days, got {loan_days}",
            policy.max_loan_days
        )));
    }
    Duration::try_days(loan_days)
        .and_then(|span| at.checked_add_signed(span))
        .ok_or_else(|| Error::invalid(format!("a loan of {loan_days} days is out of range")))
}

/// Opens a borrow and deducts its cost from the account.
///
/// The `deduct` entry starts `pending` until [`confirm_borrow`] marks the equipment as
/// issued. Fails with `InsufficientCredit` when `cost` exceeds the current balance, in
/// which case nothing is written.
pub async fn record_borrow(
    db: &DatabaseConnection,
    account_id: i64,
    request: BorrowRequest,
    at: DateTime<Utc>,
) -> Result<BorrowReceipt> {
    if request.cost <= 0 {
        return Err(Error::invalid(format!(
            "borrow cost must be positive, got {}",
            request.cost
        )));
    }
    if request.equipment_name.trim().is_empty() {
        return Err(Error::invalid("equipment name cannot be empty"));
    }
    if request.expected_return_date <= at {
        return Err(Error::invalid(
            "expected return date must be after the borrow date",
        ));
    }

    let txn = db.begin().await?;

    let account = account::get_account(&txn, account_id).await?;
    if request.cost > account.current_credit {
        return Err(Error::InsufficientCredit {
            available: account.current_credit,
            required: request.cost,
        });
    }

    let equipment_name = request.equipment_name.trim().to_string();
    let equipment_id = if request.equipment_id.trim().is_empty() {
        equipment_name.clone()
    } else {
        request.equipment_id.trim().to_string()
    };

    let borrow = borrow::ActiveModel {
        account_id: Set(account_id),
        equipment_id: Set(equipment_id),
        equipment_name: Set(equipment_name.clone()),
        borrow_date: Set(at),
        expected_return_date: Set(request.expected_return_date),
        actual_return_date: Set(None),
        credit_used: Set(request.cost),
        credit_restored: Set(0),
        status: Set(BorrowStatus::Borrowed),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let transaction = insert_entry(
        &txn,
        NewEntry {
            status: TransactionStatus::Pending,
            expected_return: Some(request.expected_return_date),
            ..NewEntry::completed(
                account_id,
                TransactionType::Deduct,
                request.cost,
                format!("Borrowed {equipment_name}"),
                at,
            )
            .for_borrow(&borrow)
        },
    )
    .await?;

    let account = account::apply_balance_change(
        &txn,
        &account,
        BalanceChange {
            used: request.cost,
            ..Default::default()
        },
    )
    .await?;

    txn.commit().await?;

    info!(
        account_id,
        borrow_id = borrow.id,
        cost = request.cost,
        balance = account.current_credit,
        "Recorded borrow of {}",
        borrow.equipment_name
    );

    Ok(BorrowReceipt {
        borrow,
        transaction,
        account,
    })
}

/// Marks the pending `deduct` entry of a borrow as completed once the equipment is issued.
///
/// A borrow can only be confirmed once.
pub async fn confirm_borrow(
    db: &DatabaseConnection,
    borrow_id: i64,
) -> Result<credit_transaction::Model> {
    let txn = db.begin().await?;

    get_borrow_by_id(&txn, borrow_id)
        .await?
        .ok_or_else(|| Error::not_found("Borrow", borrow_id))?;

    let entry = CreditTransaction::find()
        .filter(credit_transaction::Column::BorrowId.eq(borrow_id))
        .filter(credit_transaction::Column::TransactionType.eq(TransactionType::Deduct))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Transaction", format!("deduct for borrow {borrow_id}")))?;

    if entry.status == TransactionStatus::Completed {
        return Err(Error::invalid(format!(
            "borrow {borrow_id} is already confirmed"
        )));
    }

    let mut active: credit_transaction::ActiveModel = entry.into();
    active.status = Set(TransactionStatus::Completed);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    info!(borrow_id, transaction_id = updated.id, "Confirmed borrow");
    Ok(updated)
}

/// Closes an open borrow.
///
/// The refund is what the borrow still holds (`credit_used` minus anything accrual already
/// restored). A return more than a whole day late adds a `penalty` entry of
/// `penalty_per_day * days_overdue`; the penalty never takes the balance below zero.
/// Fails with `NotFound` if the borrow does not exist or was already returned.
pub async fn record_return(
    db: &DatabaseConnection,
    borrow_id: i64,
    actual_return_date: DateTime<Utc>,
    policy: &CreditPolicy,
) -> Result<ReturnReceipt> {
    let txn = db.begin().await?;

    let borrow = get_borrow_by_id(&txn, borrow_id)
        .await?
        .filter(|b| b.status == BorrowStatus::Borrowed)
        .ok_or_else(|| Error::not_found("Open borrow", borrow_id))?;

    if actual_return_date < borrow.borrow_date {
        return Err(Error::invalid("return date precedes the borrow date"));
    }

    let account = account::get_account(&txn, borrow.account_id).await?;
    let days_overdue = days_overdue(borrow.expected_return_date, actual_return_date);

    let refund_amount = borrow.credit_used - borrow.credit_restored;
    let refund = if refund_amount > 0 {
        Some(
            insert_entry(
                &txn,
                NewEntry::completed(
                    account.id,
                    TransactionType::Return,
                    refund_amount,
                    format!("Returned {}", borrow.equipment_name),
                    actual_return_date,
                )
                .for_borrow(&borrow),
            )
            .await?,
        )
    } else {
        None
    };

    let full_penalty = policy.penalty_per_day * days_overdue;
    let penalty_amount = full_penalty.min(account.current_credit + refund_amount.max(0));
    if penalty_amount < full_penalty {
        warn!(
            borrow_id,
            full_penalty, penalty_amount, "Late penalty capped at available credit"
        );
    }
    let penalty = if penalty_amount > 0 {
        Some(
            insert_entry(
                &txn,
                NewEntry::completed(
                    account.id,
                    TransactionType::Penalty,
                    penalty_amount,
                    format!(
                        "Late return of {} ({days_overdue} day(s) overdue)",
                        borrow.equipment_name
                    ),
                    actual_return_date,
                )
                .for_borrow(&borrow),
            )
            .await?,
        )
    } else {
        None
    };

    let status = if days_overdue > 0 {
        BorrowStatus::ReturnedLate
    } else {
        BorrowStatus::Returned
    };
    let mut active: borrow::ActiveModel = borrow.into();
    active.actual_return_date = Set(Some(actual_return_date));
    active.status = Set(status);
    let borrow = active.update(&txn).await?;

    let account = account::apply_balance_change(
        &txn,
        &account,
        BalanceChange {
            used: penalty_amount.max(0),
            returned: refund_amount.max(0),
            ..Default::default()
        },
    )
    .await?;

    txn.commit().await?;

    info!(
        borrow_id,
        account_id = account.id,
        days_overdue,
        refund = refund_amount,
        penalty = penalty_amount,
        balance = account.current_credit,
        "Recorded return of {}",
        borrow.equipment_name
    );

    Ok(ReturnReceipt {
        borrow,
        refund,
        penalty,
        days_overdue,
        account,
    })
}

/// Awards bonus credit to an account.
///
/// When the policy sets a bonus ceiling the award is trimmed so the balance does not
/// pass it; an account already at the ceiling gets `InvalidArgument`.
pub async fn record_bonus(
    db: &DatabaseConnection,
    account_id: i64,
    amount: i64,
    admin_note: &str,
    policy: &CreditPolicy,
    at: DateTime<Utc>,
) -> Result<BonusReceipt> {
    if amount <= 0 {
        return Err(Error::invalid(format!(
            "bonus amount must be positive, got {amount}"
        )));
    }

    let txn = db.begin().await?;
    let account = account::get_account(&txn, account_id).await?;

    let applied = match policy.bonus_ceiling(account.initial_credit) {
        Some(ceiling) => amount.min(ceiling - account.current_credit),
        None => amount,
    };
    if applied <= 0 {
        return Err(Error::invalid(format!(
            "account {account_id} is already at the bonus ceiling"
        )));
    }

    let note = admin_note.trim();
    let transaction = insert_entry(
        &txn,
        NewEntry {
            admin_note: (!note.is_empty()).then(|| note.to_string()),
            ..NewEntry::completed(
                account_id,
                TransactionType::Bonus,
                applied,
                "Administrative bonus".to_string(),
                at,
            )
        },
    )
    .await?;

    let account = account::apply_balance_change(
        &txn,
        &account,
        BalanceChange {
            bonus: applied,
            ..Default::default()
        },
    )
    .await?;

    txn.commit().await?;

    info!(
        account_id,
        requested = amount,
        applied,
        balance = account.current_credit,
        "Recorded bonus"
    );

    Ok(BonusReceipt {
        transaction,
        requested: amount,
        account,
    })
}
