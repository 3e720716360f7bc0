//! Account business logic - Creation, lookup and balance updates for credit accounts.
//!
//! Balance changes go through [`apply_balance_change`], which moves `current_credit` and the
//! matching accumulator together and bumps `version` under an optimistic check, so the
//! identity `current = initial - used + returned + bonus` holds after every committed write.

use crate::{
    config::policy::{Config, CreditPolicy},
    entities::{Account, Borrow, BorrowStatus, account, borrow},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::info;

/// Changes to apply to an account's accumulators in one write.
///
/// Every field is a non-negative increment. `current_credit` moves by
/// `returned + bonus - used`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceChange {
    /// Added to `total_used`
    pub used: i64,
    /// Added to `total_returned`
    pub returned: i64,
    /// Added to `total_bonus`
    pub bonus: i64,
    /// New `last_accrual_at`, when accrual consumed whole periods
    pub last_accrual_at: Option<DateTime<Utc>>,
}

impl BalanceChange {
    /// Net movement of `current_credit`.
    #[must_use]
    pub const fn net(&self) -> i64 {
        self.returned + self.bonus - self.used
    }
}

/// Read-only view of an account with its live `pending_return`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSnapshot {
    /// The stored account row
    pub account: account::Model,
    /// Sum of `credit_used` over borrows still out
    pub pending_return: i64,
    /// Number of borrows still out
    pub open_borrows: usize,
}

/// Creates a new account with the given starting credit.
pub async fn create_account(
    db: &DatabaseConnection,
    user_id: &str,
    initial_credit: i64,
    at: DateTime<Utc>,
) -> Result<account::Model> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(Error::invalid("user id cannot be empty"));
    }
    if initial_credit < 0 {
        return Err(Error::invalid(format!(
            "initial credit must not be negative, got {initial_credit}"
        )));
    }
    if get_account_by_user(db, user_id).await?.is_some() {
        return Err(Error::invalid(format!(
            "account for user {user_id} already exists"
        )));
    }

    let model = account::ActiveModel {
        user_id: Set(user_id.to_string()),
        initial_credit: Set(initial_credit),
        current_credit: Set(initial_credit),
        total_used: Set(0),
        total_returned: Set(0),
        total_bonus: Set(0),
        last_accrual_at: Set(at),
        created_at: Set(at),
        version: Set(0),
        ..Default::default()
    };

    let account = model.insert(db).await?;
    info!(
        account_id = account.id,
        user_id = %account.user_id,
        initial_credit,
        "Created credit account"
    );
    Ok(account)
}

/// Fetches an account by primary key, failing with `NotFound` if absent.
pub async fn get_account<C>(db: &C, account_id: i64) -> Result<account::Model>
where
    C: ConnectionTrait,
{
    Account::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Account", account_id))
}

/// Finds the account owned by a Discord user.
pub async fn get_account_by_user(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Option<account::Model>> {
    Account::find()
        .filter(account::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the user's account, creating it with the policy's default credit on first use.
pub async fn get_or_create_account(
    db: &DatabaseConnection,
    user_id: &str,
    policy: &CreditPolicy,
    at: DateTime<Utc>,
) -> Result<account::Model> {
    match get_account_by_user(db, user_id.trim()).await? {
        Some(account) => Ok(account),
        None => create_account(db, user_id, policy.default_initial_credit, at).await,
    }
}

/// Lists every account, oldest first.
pub async fn get_all_accounts(db: &DatabaseConnection) -> Result<Vec<account::Model>> {
    Account::find()
        .order_by_asc(account::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates the accounts listed in `[[accounts]]` that do not exist yet.
///
/// Returns how many accounts were created.
pub async fn seed_accounts(
    db: &DatabaseConnection,
    config: &Config,
    at: DateTime<Utc>,
) -> Result<usize> {
    let mut created = 0;
    for seed in &config.accounts {
        if get_account_by_user(db, seed.user_id.trim()).await?.is_some() {
            continue;
        }
        let initial = seed
            .initial_credit
            .unwrap_or(config.policy.default_initial_credit);
        create_account(db, &seed.user_id, initial, at).await?;
        created += 1;
    }
    Ok(created)
}

/// Sums `credit_used` over the account's borrows still in the `borrowed` state.
pub async fn pending_return<C>(db: &C, account_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let open = Borrow::find()
        .filter(borrow::Column::AccountId.eq(account_id))
        .filter(borrow::Column::Status.eq(BorrowStatus::Borrowed))
        .all(db)
        .await?;
    Ok(open.iter().map(|b| b.credit_used).sum())
}

/// Reads the account and its pending return inside one transaction.
pub async fn get_account_snapshot(
    db: &DatabaseConnection,
    account_id: i64,
) -> Result<AccountSnapshot> {
    let txn = db.begin().await?;
    let account = get_account(&txn, account_id).await?;
    let open = Borrow::find()
        .filter(borrow::Column::AccountId.eq(account_id))
        .filter(borrow::Column::Status.eq(BorrowStatus::Borrowed))
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(AccountSnapshot {
        account,
        pending_return: open.iter().map(|b| b.credit_used).sum(),
        open_borrows: open.len(),
    })
}

/// Applies a [`BalanceChange`] to an account previously read as `account`.
///
/// The update only matches while the row still carries `account.version`; otherwise
/// another writer got there first and `ConcurrencyConflict` is returned.
pub async fn apply_balance_change<C>(
    db: &C,
    account: &account::Model,
    change: BalanceChange,
) -> Result<account::Model>
where
    C: ConnectionTrait,
{
    let mut update = Account::update_many()
        .col_expr(
            account::Column::CurrentCredit,
            Expr::col(account::Column::CurrentCredit).add(change.net()),
        )
        .col_expr(
            account::Column::TotalUsed,
            Expr::col(account::Column::TotalUsed).add(change.used),
        )
        .col_expr(
            account::Column::TotalReturned,
            Expr::col(account::Column::TotalReturned).add(change.returned),
        )
        .col_expr(
            account::Column::TotalBonus,
            Expr::col(account::Column::TotalBonus).add(change.bonus),
        )
        .col_expr(
            account::Column::Version,
            Expr::col(account::Column::Version).add(1),
        );

    if let Some(last_accrual_at) = change.last_accrual_at {
        update = update.col_expr(account::Column::LastAccrualAt, Expr::value(last_accrual_at));
    }

    let result = update
        .filter(account::Column::Id.eq(account.id))
        .filter(account::Column::Version.eq(account.version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::ConcurrencyConflict {
            account_id: account.id,
        });
    }

    get_account(db, account.id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::policy::AccountSeed;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_account_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_account(&db, "   ", 100, Utc::now()).await;
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));

        let result = create_account(&db, "user1", -1, Utc::now()).await;
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_account_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let account = create_account(&db, " user1 ", 120, Utc::now()).await?;

        assert_eq!(account.user_id, "user1");
        assert_eq!(account.initial_credit, 120);
        assert_eq!(account.current_credit, 120);
        assert_eq!(account.total_used, 0);
        assert_eq!(account.version, 0);
        assert!(account.is_balanced());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_account_duplicate_user_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_account(&db, "user1").await?;

        let result = create_account(&db, "user1", 50, Utc::now()).await;
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_account_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_account(&db, 999).await;
        assert!(matches!(
            result,
            Err(Error::NotFound {
                entity: "Account",
                ..
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_or_create_account_reuses_existing() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = CreditPolicy::default();

        let first = get_or_create_account(&db, "user1", &policy, Utc::now()).await?;
        let second = get_or_create_account(&db, "user1", &policy, Utc::now()).await?;

        assert_eq!(first.id, second.id);
        assert_eq!(first.initial_credit, policy.default_initial_credit);
        assert_eq!(get_all_accounts(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_accounts_skips_existing() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_account(&db, "existing").await?;

        let config = Config {
            policy: CreditPolicy::default(),
            accounts: vec![
                AccountSeed {
                    user_id: "existing".to_string(),
                    initial_credit: Some(500),
                },
                AccountSeed {
                    user_id: "fresh".to_string(),
                    initial_credit: Some(250),
                },
                AccountSeed {
                    user_id: "defaulted".to_string(),
                    initial_credit: None,
                },
            ],
            ..Config::default()
        };

        let created = seed_accounts(&db, &config, Utc::now()).await?;
        assert_eq!(created, 2);

        let existing = get_account_by_user(&db, "existing").await?.unwrap();
        assert_eq!(existing.initial_credit, 100);
        let fresh = get_account_by_user(&db, "fresh").await?.unwrap();
        assert_eq!(fresh.initial_credit, 250);
        let defaulted = get_account_by_user(&db, "defaulted").await?.unwrap();
        assert_eq!(defaulted.initial_credit, 100);

        // Seeding again is a no-op
        assert_eq!(seed_accounts(&db, &config, Utc::now()).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_balance_change_updates_totals() -> Result<()> {
        let (db, account) = setup_with_account().await?;

        let change = BalanceChange {
            used: 20,
            returned: 5,
            bonus: 3,
            last_accrual_at: None,
        };
        let updated = apply_balance_change(&db, &account, change).await?;

        assert_eq!(updated.current_credit, 88);
        assert_eq!(updated.total_used, 20);
        assert_eq!(updated.total_returned, 5);
        assert_eq!(updated.total_bonus, 3);
        assert_eq!(updated.version, account.version + 1);
        assert!(updated.is_balanced());
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_balance_change_stale_version_conflicts() -> Result<()> {
        let (db, account) = setup_with_account().await?;

        let change = BalanceChange {
            used: 10,
            ..Default::default()
        };
        apply_balance_change(&db, &account, change).await?;

        // `account` still carries the old version
        let result = apply_balance_change(&db, &account, change).await;
        assert!(matches!(
            result,
            Err(Error::ConcurrencyConflict { account_id }) if account_id == account.id
        ));

        let stored = get_account(&db, account.id).await?;
        assert_eq!(stored.current_credit, 90);
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshot_pending_return() -> Result<()> {
        let (db, account) = setup_with_account().await?;
        create_test_borrow(&db, account.id, 15).await?;
        create_test_borrow(&db, account.id, 10).await?;

        let snapshot = get_account_snapshot(&db, account.id).await?;
        assert_eq!(snapshot.pending_return, 25);
        assert_eq!(snapshot.open_borrows, 2);
        assert_eq!(snapshot.account.current_credit, 75);
        assert_eq!(pending_return(&db, account.id).await?, 25);
        Ok(())
    }
}
