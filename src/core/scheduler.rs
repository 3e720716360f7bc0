//! Periodic accrual sweep.

use crate::core::service::Ledger;
use std::time::Duration;
use tokio::{sync::watch, time};
use tracing::{error, info, trace};

/// Runs [`Ledger::accrue_all`] on a fixed interval.
#[derive(Debug, Clone)]
pub struct AccrualScheduler {
    ledger: Ledger,
    interval: Duration,
}

impl AccrualScheduler {
    /// Scheduler using the policy's `accrual_check_interval_minutes`.
    #[must_use]
    pub fn from_policy(ledger: Ledger) -> Self {
        let minutes = ledger.policy().accrual_check_interval_minutes;
        Self::new(ledger, Duration::from_secs(minutes.saturating_mul(60)))
    }

    /// Scheduler with an explicit interval.
    #[must_use]
    pub const fn new(ledger: Ledger, interval: Duration) -> Self {
        Self { ledger, interval }
    }

    /// Sweeps until `cancel` is set to `true`. The first sweep runs immediately.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        info!(
            "Accrual scheduler started, interval={}s",
            self.interval.as_secs()
        );

        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.ledger.accrue_all().await {
                        Ok(outcomes) => trace!(accounts = outcomes.len(), "Accrual sweep done"),
                        Err(e) => error!("Accrual sweep failed: {e}"),
                    }
                }
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        info!("Accrual scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }
}
