//! Transaction history queries.
//!
//! History is read newest first (by insertion order) and can be narrowed to one
//! transaction type. Pages are 1-based.

use crate::{
    core::account::get_account,
    entities::{CreditTransaction, TransactionType, credit_transaction},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;
use std::str::FromStr;

/// Which ledger entries to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFilter {
    /// Every entry
    #[default]
    All,
    /// Only entries of this type
    Type(TransactionType),
}

impl FromStr for HistoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse().map(Self::Type)
    }
}

/// One page of history plus the totals needed to page through the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryPage {
    /// Entries on this page, newest first
    pub items: Vec<credit_transaction::Model>,
    /// Entries matching the filter across all pages
    pub total_count: u64,
    /// This page's number, starting at 1
    pub page: u64,
    /// Requested page size
    pub page_size: u64,
    /// Number of pages available
    pub total_pages: u64,
}

/// Returns one page of an account's history.
///
/// Fails with `InvalidArgument` when `page` is 0 or `page_size` is outside
/// `1..=max_page_size`, and with `NotFound` for an unknown account.
pub async fn list_history(
    db: &DatabaseConnection,
    account_id: i64,
    filter: HistoryFilter,
    page: u64,
    page_size: u64,
    max_page_size: u64,
) -> Result<HistoryPage> {
    if page == 0 {
        return Err(Error::invalid("page numbers start at 1"));
    }
    if page_size == 0 || page_size > max_page_size {
        return Err(Error::invalid(format!(
            "page size must be between 1 and {max_page_size}, got {page_size}"
        )));
    }

    let txn = db.begin().await?;
    get_account(&txn, account_id).await?;

    let mut query = CreditTransaction::find()
        .filter(credit_transaction::Column::AccountId.eq(account_id));
    if let HistoryFilter::Type(transaction_type) = filter {
        query = query.filter(credit_transaction::Column::TransactionType.eq(transaction_type));
    }

    let paginator = query
        .order_by_desc(credit_transaction::Column::Id)
        .paginate(&txn, page_size);
    let counts = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;
    txn.commit().await?;

    Ok(HistoryPage {
        items,
        total_count: counts.number_of_items,
        page,
        page_size,
        total_pages: counts.number_of_pages,
    })
}

/// Finds a ledger entry by its ID.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<Option<credit_transaction::Model>> {
    CreditTransaction::find_by_id(transaction_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// All ledger entries tied to one borrow, oldest first.
pub async fn get_transactions_for_borrow(
    db: &DatabaseConnection,
    borrow_id: i64,
) -> Result<Vec<credit_transaction::Model>> {
    CreditTransaction::find()
        .filter(credit_transaction::Column::BorrowId.eq(borrow_id))
        .order_by_asc(credit_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::policy::CreditPolicy;
    use crate::core::ledger;
    use crate::test_utils::*;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};

    const MAX: u64 = 50;

    #[test]
    fn test_history_filter_parsing() {
        assert_eq!("all".parse::<HistoryFilter>().unwrap(), HistoryFilter::All);
        assert_eq!("".parse::<HistoryFilter>().unwrap(), HistoryFilter::All);
        assert_eq!(
            "Penalty".parse::<HistoryFilter>().unwrap(),
            HistoryFilter::Type(TransactionType::Penalty)
        );
        assert!(matches!(
            "refund".parse::<HistoryFilter>(),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_history_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        for (page, size) in [(0, 10), (1, 0), (1, MAX + 1)] {
            let result = list_history(&db, 1, HistoryFilter::All, page, size, MAX).await;
            assert!(matches!(result, Err(Error::InvalidArgument { .. })));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_list_history_all_newest_first() -> Result<()> {
        let (db, account) = setup_with_account().await?;
        let now = Utc::now();
        let receipt =
            borrow_at(&db, account.id, "Camera", 15, now, now + Duration::days(1)).await?;
        ledger::record_return(
            &db,
            receipt.borrow.id,
            now + Duration::days(3),
            &CreditPolicy::default(),
        )
        .await?;
        ledger::record_bonus(&db, account.id, 10, "", &CreditPolicy::default(), now).await?;

        let page = list_history(&db, account.id, HistoryFilter::All, 1, 10, MAX).await?;
        assert_eq!(page.total_count, 4);
        assert_eq!(page.total_pages, 1);
        let types: Vec<_> = page.items.iter().map(|t| t.transaction_type).collect();
        assert_eq!(
            types,
            vec![
                TransactionType::Bonus,
                TransactionType::Penalty,
                TransactionType::Return,
                TransactionType::Deduct,
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_list_history_filter_by_type() -> Result<()> {
        let (db, account) = setup_with_account().await?;
        create_test_borrow(&db, account.id, 10).await?;
        create_test_borrow(&db, account.id, 5).await?;
        ledger::record_bonus(&db, account.id, 10, "", &CreditPolicy::default(), Utc::now())
            .await?;

        let deducts = list_history(
            &db,
            account.id,
            HistoryFilter::Type(TransactionType::Deduct),
            1,
            10,
            MAX,
        )
        .await?;
        assert_eq!(deducts.total_count, 2);
        assert!(
            deducts
                .items
                .iter()
                .all(|t| t.transaction_type == TransactionType::Deduct)
        );

        let penalties = list_history(
            &db,
            account.id,
            HistoryFilter::Type(TransactionType::Penalty),
            1,
            10,
            MAX,
        )
        .await?;
        assert_eq!(penalties.total_count, 0);
        assert!(penalties.items.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_history_pagination() -> Result<()> {
        let (db, account) = setup_with_account().await?;
        for _ in 0..7 {
            create_test_borrow(&db, account.id, 1).await?;
        }

        let first = list_history(&db, account.id, HistoryFilter::All, 1, 3, MAX).await?;
        let third = list_history(&db, account.id, HistoryFilter::All, 3, 3, MAX).await?;
        let beyond = list_history(&db, account.id, HistoryFilter::All, 4, 3, MAX).await?;

        assert_eq!(first.total_count, 7);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.items.len(), 3);
        assert!(first.items[0].id > first.items[2].id);
        assert_eq!(third.items.len(), 1);
        assert!(beyond.items.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_history_unknown_account() -> Result<()> {
        let db = setup_test_db().await?;
        let result = list_history(&db, 3, HistoryFilter::All, 1, 10, MAX).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_transactions_for_borrow() -> Result<()> {
        let (db, account) = setup_with_account().await?;
        let receipt = create_test_borrow(&db, account.id, 10).await?;
        ledger::record_return(
            &db,
            receipt.borrow.id,
            receipt.borrow.borrow_date + Duration::days(1),
            &CreditPolicy::default(),
        )
        .await?;

        let entries = get_transactions_for_borrow(&db, receipt.borrow.id).await?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].transaction_type, TransactionType::Deduct);
        assert_eq!(entries[1].transaction_type, TransactionType::Return);

        let found = get_transaction_by_id(&db, entries[0].id).await?;
        assert_eq!(found, Some(entries[0].clone()));
        assert!(get_transaction_by_id(&db, 999).await?.is_none());
        Ok(())
    }
}
