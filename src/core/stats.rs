//! Monthly statistics over the ledger.
//!
//! Entries are bucketed by the calendar month (UTC) of their `date`. Deducts and
//! penalties count as credit taken, returns and bonuses as credit given back.

use crate::{
    core::account::get_account,
    entities::{CreditTransaction, credit_transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::{TransactionTrait, prelude::*};
use serde::Serialize;

/// Totals for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyStats {
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1-12
    pub month: u32,
    /// Sum of `deduct` and `penalty` amounts
    pub total_deducted: i64,
    /// Sum of `return` and `bonus` amounts
    pub total_returned: i64,
    /// Number of entries in the month
    pub transaction_count: usize,
}

/// Start of the month containing `reference` and start of the following month.
pub fn month_bounds(reference: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let (year, month) = (reference.year(), reference.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| Error::invalid(format!("invalid reference month {year}-{month}")))?;
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| Error::invalid(format!("invalid month {next_year}-{next_month}")))?;

    Ok((start.and_utc(), end.and_utc()))
}

/// Totals the entries that fall in the same month as `reference`.
#[must_use]
pub fn summarize_month(
    transactions: &[credit_transaction::Model],
    reference: DateTime<Utc>,
) -> MonthlyStats {
    let in_month = transactions
        .iter()
        .filter(|t| t.date.year() == reference.year() && t.date.month() == reference.month());

    let mut stats = MonthlyStats {
        year: reference.year(),
        month: reference.month(),
        total_deducted: 0,
        total_returned: 0,
        transaction_count: 0,
    };
    for transaction in in_month {
        if transaction.transaction_type.is_debit() {
            stats.total_deducted += transaction.amount;
        } else {
            stats.total_returned += transaction.amount;
        }
        stats.transaction_count += 1;
    }
    stats
}

/// Computes [`MonthlyStats`] for an account in the month containing `reference`.
pub async fn compute_monthly_stats(
    db: &DatabaseConnection,
    account_id: i64,
    reference: DateTime<Utc>,
) -> Result<MonthlyStats> {
    let (start, end) = month_bounds(reference)?;

    let txn = db.begin().await?;
    get_account(&txn, account_id).await?;
    let transactions = CreditTransaction::find()
        .filter(credit_transaction::Column::AccountId.eq(account_id))
        .filter(credit_transaction::Column::Date.gte(start))
        .filter(credit_transaction::Column::Date.lt(end))
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(summarize_month(&transactions, reference))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::policy::CreditPolicy;
    use crate::core::ledger;
    use crate::entities::{TransactionStatus, TransactionType};
    use crate::test_utils::*;
    use chrono::{Duration, TimeZone};

    fn entry(
        id: i64,
        transaction_type: TransactionType,
        amount: i64,
        date: DateTime<Utc>,
    ) -> credit_transaction::Model {
        credit_transaction::Model {
            id,
            account_id: 1,
            transaction_type,
            amount,
            reason: "test".to_string(),
            date,
            status: TransactionStatus::Completed,
            borrow_id: None,
            equipment_name: None,
            expected_return: None,
            admin_note: None,
        }
    }

    #[test]
    fn test_month_bounds_december_rolls_year() {
        let reference = Utc.with_ymd_and_hms(2023, 12, 15, 8, 30, 0).unwrap();
        let (start, end) = month_bounds(reference).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_summarize_month_partitions_by_type_and_month() {
        let march = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let april = Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap();
        let last_year = Utc.with_ymd_and_hms(2023, 3, 10, 0, 0, 0).unwrap();

        let transactions = vec![
            entry(1, TransactionType::Deduct, 15, march),
            entry(2, TransactionType::Penalty, 5, march),
            entry(3, TransactionType::Return, 15, march),
            entry(4, TransactionType::Bonus, 20, march),
            entry(5, TransactionType::Deduct, 40, april),
            entry(6, TransactionType::Deduct, 40, last_year),
        ];

        let stats = summarize_month(&transactions, march);
        assert_eq!(stats.year, 2024);
        assert_eq!(stats.month, 3);
        assert_eq!(stats.total_deducted, 20);
        assert_eq!(stats.total_returned, 35);
        assert_eq!(stats.transaction_count, 4);
    }

    #[test]
    fn test_summarize_month_empty() {
        let stats = summarize_month(&[], Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
        assert_eq!(stats.transaction_count, 0);
        assert_eq!(stats.total_deducted, 0);
        assert_eq!(stats.total_returned, 0);
    }

    #[tokio::test]
    async fn test_compute_monthly_stats_integration() -> Result<()> {
        let (db, account) = setup_with_account().await?;
        let policy = CreditPolicy::default();
        let may = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();

        let receipt = borrow_at(&db, account.id, "Camera", 15, may, may + Duration::days(5))
            .await?;
        // Returned two days late, in June
        ledger::record_return(&db, receipt.borrow.id, may + Duration::days(12), &policy).await?;
        ledger::record_bonus(&db, account.id, 8, "", &policy, may).await?;

        let in_may = compute_monthly_stats(&db, account.id, may).await?;
        assert_eq!(in_may.total_deducted, 15);
        assert_eq!(in_may.total_returned, 8);
        assert_eq!(in_may.transaction_count, 2);

        let in_june = compute_monthly_stats(&db, account.id, may + Duration::days(12)).await?;
        assert_eq!(in_june.total_deducted, 35);
        assert_eq!(in_june.total_returned, 15);
        assert_eq!(in_june.transaction_count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_compute_monthly_stats_unknown_account() -> Result<()> {
        let db = setup_test_db().await?;
        let result = compute_monthly_stats(&db, 9, Utc::now()).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }
}
