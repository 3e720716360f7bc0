//! The ledger's narrow interface and its database-backed implementation.
//!
//! Presentation code talks to [`CreditLedger`] only, so it can be pointed at another
//! backend without change. [`Ledger`] implements it over SeaORM, taking the account's
//! lock around every mutating call and stamping operations with the current time.

use crate::{
    config::policy::CreditPolicy,
    core::{
        accrual::{self, AccrualOutcome},
        account::{self, AccountSnapshot},
        borrow::{self, BorrowFilter, BorrowView},
        history::{self, HistoryFilter, HistoryPage},
        ledger::{self, BonusReceipt, BorrowReceipt, BorrowRequest, ReturnReceipt},
        locks::AccountLocks,
        stats::{self, MonthlyStats},
    },
    entities::{account as account_entity, credit_transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{error, info};

/// Read queries and mutating commands over credit accounts.
#[allow(async_fn_in_trait)]
pub trait CreditLedger {
    /// Current balance, totals and pending return.
    async fn account_snapshot(&self, account_id: i64) -> Result<AccountSnapshot>;

    /// One page of history, newest first.
    async fn list_history(
        &self,
        account_id: i64,
        filter: HistoryFilter,
        page: u64,
        page_size: u64,
    ) -> Result<HistoryPage>;

    /// Borrows whose current state passes `filter`.
    async fn list_borrows(&self, account_id: i64, filter: BorrowFilter)
    -> Result<Vec<BorrowView>>;

    /// Totals for the month containing `reference`.
    async fn monthly_stats(
        &self,
        account_id: i64,
        reference: DateTime<Utc>,
    ) -> Result<MonthlyStats>;

    /// Opens a borrow and deducts its cost.
    async fn record_borrow(&self, account_id: i64, request: BorrowRequest)
    -> Result<BorrowReceipt>;

    /// Marks a borrow's deduct entry completed once the equipment is issued.
    async fn confirm_borrow(&self, borrow_id: i64) -> Result<credit_transaction::Model>;

    /// Closes a borrow, refunding and penalizing as needed.
    async fn record_return(
        &self,
        borrow_id: i64,
        actual_return_date: DateTime<Utc>,
    ) -> Result<ReturnReceipt>;

    /// Awards administrative bonus credit.
    async fn record_bonus(
        &self,
        account_id: i64,
        amount: i64,
        admin_note: &str,
    ) -> Result<BonusReceipt>;

    /// Runs time-based restoration for one account.
    async fn accrue_time_based_return(&self, account_id: i64) -> Result<Option<AccrualOutcome>>;
}

/// SeaORM-backed [`CreditLedger`].
#[derive(Debug, Clone)]
pub struct Ledger {
    db: Arc<DatabaseConnection>,
    locks: AccountLocks,
    policy: CreditPolicy,
}

impl Ledger {
    /// Creates a ledger over `db` governed by `policy`.
    #[must_use]
    pub fn new(db: DatabaseConnection, policy: CreditPolicy) -> Self {
        Self {
            db: Arc::new(db),
            locks: AccountLocks::new(),
            policy,
        }
    }

    /// The underlying database connection.
    #[must_use]
    pub fn database(&self) -> &DatabaseConnection {
        &self.db
    }

    /// The rules this ledger applies.
    #[must_use]
    pub const fn policy(&self) -> &CreditPolicy {
        &self.policy
    }

    /// Returns the user's account, creating it on first use.
    pub async fn account_for_user(&self, user_id: &str) -> Result<account_entity::Model> {
        account::get_or_create_account(&*self.db, user_id, &self.policy, Utc::now()).await
    }

    /// Runs accrual for every account, one account lock at a time.
    ///
    /// A failure on one account is logged and does not stop the others.
    pub async fn accrue_all(&self) -> Result<Vec<AccrualOutcome>> {
        let accounts = account::get_all_accounts(&*self.db).await?;
        let mut outcomes = Vec::new();
        for acct in accounts {
            match self.accrue_time_based_return(acct.id).await {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => {}
                Err(e) => error!(account_id = acct.id, "Accrual failed: {e}"),
            }
        }
        info!(
            accounts_credited = outcomes.iter().filter(|o| o.amount > 0).count(),
            "Accrual sweep finished"
        );
        Ok(outcomes)
    }

    async fn account_of_borrow(&self, borrow_id: i64) -> Result<i64> {
        borrow::get_borrow_by_id(&*self.db, borrow_id)
            .await?
            .map(|b| b.account_id)
            .ok_or_else(|| Error::not_found("Borrow", borrow_id))
    }
}

impl CreditLedger for Ledger {
    async fn account_snapshot(&self, account_id: i64) -> Result<AccountSnapshot> {
        account::get_account_snapshot(&*self.db, account_id).await
    }

    async fn list_history(
        &self,
        account_id: i64,
        filter: HistoryFilter,
        page: u64,
        page_size: u64,
    ) -> Result<HistoryPage> {
        history::list_history(
            &*self.db,
            account_id,
            filter,
            page,
            page_size,
            self.policy.history_max_page_size,
        )
        .await
    }

    async fn list_borrows(
        &self,
        account_id: i64,
        filter: BorrowFilter,
    ) -> Result<Vec<BorrowView>> {
        borrow::list_borrows(&*self.db, account_id, filter, Utc::now()).await
    }

    async fn monthly_stats(
        &self,
        account_id: i64,
        reference: DateTime<Utc>,
    ) -> Result<MonthlyStats> {
        stats::compute_monthly_stats(&*self.db, account_id, reference).await
    }

    async fn record_borrow(
        &self,
        account_id: i64,
        request: BorrowRequest,
    ) -> Result<BorrowReceipt> {
        let now = Utc::now();
        let latest_due = ledger::due_date(now, self.policy.max_loan_days, &self.policy)?;
        if request.expected_return_date > latest_due {
            return Err(Error::invalid(format!(
                "loans may last at most {} days",
                self.policy.max_loan_days
            )));
        }

        let _guard = self.locks.lock(account_id).await;
        ledger::record_borrow(&*self.db, account_id, request, now).await
    }

    async fn confirm_borrow(&self, borrow_id: i64) -> Result<credit_transaction::Model> {
        let account_id = self.account_of_borrow(borrow_id).await?;
        let _guard = self.locks.lock(account_id).await;
        ledger::confirm_borrow(&*self.db, borrow_id).await
    }

    async fn record_return(
        &self,
        borrow_id: i64,
        actual_return_date: DateTime<Utc>,
    ) -> Result<ReturnReceipt> {
        let account_id = self.account_of_borrow(borrow_id).await?;
        let _guard = self.locks.lock(account_id).await;
        ledger::record_return(&*self.db, borrow_id, actual_return_date, &self.policy).await
    }

    async fn record_bonus(
        &self,
        account_id: i64,
        amount: i64,
        admin_note: &str,
    ) -> Result<BonusReceipt> {
        let _guard = self.locks.lock(account_id).await;
        ledger::record_bonus(
            &*self.db,
            account_id,
            amount,
            admin_note,
            &self.policy,
            Utc::now(),
        )
        .await
    }

    async fn accrue_time_based_return(&self, account_id: i64) -> Result<Option<AccrualOutcome>> {
        let _guard = self.locks.lock(account_id).await;
        accrual::accrue_time_based_return(&*self.db, account_id, &self.policy, Utc::now()).await
    }
}
