//! Per-account mutual exclusion.
//!
//! Mutating ledger calls on the same account run one at a time; calls on different
//! accounts never wait on each other.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of one async mutex per account, created on first use.
#[derive(Debug, Clone, Default)]
pub struct AccountLocks {
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `account_id`. Access lasts until the guard is dropped.
    pub async fn lock(&self, account_id: i64) -> OwnedMutexGuard<()> {
        let mutex = Arc::clone(
            self.locks
                .entry(account_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        // The map shard is released before awaiting.
        mutex.lock_owned().await
    }

    /// Number of accounts that have been locked at least once.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no account has been locked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
