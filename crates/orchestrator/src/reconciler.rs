//! Background reconciler for owed inventory restores.
//!
//! Compensation failures never abort a committed status transition;
//! they leave a pending entry in the restore log instead. This task
//! sweeps the log and retries the restores until they land.

use std::time::Duration;

use clients::InventoryClient;
use order_store::RestoreLog;

use crate::error::Result;

/// Retries pending inventory restores on a fixed interval.
pub struct RestoreReconciler<L, I> {
    log: L,
    inventory: I,
    interval: Duration,
}

impl<L, I> RestoreReconciler<L, I>
where
    L: RestoreLog,
    I: InventoryClient,
{
    /// Creates a reconciler over the restore log and inventory client.
    pub fn new(log: L, inventory: I, interval: Duration) -> Self {
        Self {
            log,
            inventory,
            interval,
        }
    }

    /// Runs one sweep over the pending entries; returns how many
    /// restores completed.
    ///
    /// Each entry is claimed before its restore is attempted, so a
    /// concurrent worker cannot perform the same restore twice. A
    /// failed attempt reopens the entry for the next sweep.
    pub async fn run_once(&self) -> Result<usize> {
        let pending = self.log.pending().await?;
        if pending.is_empty() {
            return Ok(0);
        }

        tracing::debug!(entries = pending.len(), "reconciling owed inventory restores");
        let mut restored = 0;
        for entry in pending {
            if !self.log.mark_restored(entry.order_id, entry.reason).await? {
                continue;
            }
            match self
                .inventory
                .increment_quantity(entry.ticket_type_ref, entry.quantity)
                .await
            {
                Ok(()) => {
                    metrics::counter!("inventory_restores_reconciled_total").increment(1);
                    tracing::info!(
                        order_id = %entry.order_id,
                        reason = ?entry.reason,
                        quantity = entry.quantity,
                        "owed inventory restore completed"
                    );
                    restored += 1;
                }
                Err(err) => {
                    self.log.reopen(entry.order_id, entry.reason).await?;
                    tracing::warn!(
                        order_id = %entry.order_id,
                        reason = ?entry.reason,
                        error = %err,
                        "owed inventory restore still failing"
                    );
                }
            }
        }
        Ok(restored)
    }
}

impl<L, I> RestoreReconciler<L, I>
where
    L: RestoreLog + 'static,
    I: InventoryClient + 'static,
{
    /// Spawns the reconciler as a background task sweeping on its
    /// interval. Sweep errors are logged, never fatal.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // The immediate first tick would race application startup.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(err) = self.run_once().await {
                    tracing::error!(error = %err, "restore reconciliation sweep failed");
                }
            }
        })
    }
}
