//! The order lifecycle orchestrator.
//!
//! Drives the create / confirm / cancel sagas across the inventory,
//! payment, and schedule collaborators, with compensating inventory
//! restores recorded durably before they are attempted.

use chrono::Utc;
use common::{OrderId, UserId};
use domain::{Money, NewOrder, Order, PassengerDetails, PaymentMethod, PaymentStatus};
use order_store::{OrderStore, RestoreLog, RestoreReason};

use clients::{InventoryClient, PaymentClient, ScheduleClient};
use common::{ScheduleId, TicketTypeId};

use crate::error::{OrchestratorError, Result};
use crate::snapshot::SnapshotBuilder;

/// Request to create an order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub user_ref: UserId,
    pub user_email: Option<String>,
    pub schedule_ref: ScheduleId,
    pub ticket_type_ref: TicketTypeId,
    pub ticket_type_name: Option<String>,
    pub quantity: u32,
    /// Total claimed by the caller. The server always recomputes the
    /// authoritative total; a mismatch is logged, never an error.
    pub claimed_total: Option<Money>,
    pub payment_method: PaymentMethod,
    pub passenger_details: serde_json::Value,
}

/// Coordinates the multi-step order lifecycle.
///
/// The persisted order row is the single source of truth; this
/// orchestrator is its only writer. Inventory quantity is owned by the
/// inventory collaborator and never read-modify-written locally.
pub struct OrderOrchestrator<St, I, P, Sc> {
    store: St,
    inventory: I,
    payment: P,
    snapshots: SnapshotBuilder<Sc>,
}

impl<St, I, P, Sc> OrderOrchestrator<St, I, P, Sc>
where
    St: OrderStore + RestoreLog,
    I: InventoryClient,
    P: PaymentClient,
    Sc: ScheduleClient,
{
    /// Creates an orchestrator over a store and the three collaborators.
    pub fn new(store: St, inventory: I, payment: P, schedule: Sc) -> Self {
        Self {
            store,
            inventory,
            payment,
            snapshots: SnapshotBuilder::new(schedule),
        }
    }

    /// Creates an order: checks availability, computes the total,
    /// freezes a schedule snapshot, persists, then reserves inventory.
    ///
    /// If the final inventory decrement fails, the just-persisted order
    /// is deleted again so no order exists without a reservation.
    #[tracing::instrument(skip(self, cmd), fields(user = %cmd.user_ref, ticket_type = %cmd.ticket_type_ref))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<Order> {
        metrics::counter!("orders_create_attempts_total").increment(1);
        let start = std::time::Instant::now();

        if cmd.quantity == 0 {
            return Err(OrchestratorError::Validation(
                "quantity must be greater than zero".to_string(),
            ));
        }

        // 1. Availability check against the inventory collaborator.
        let ticket_type = self.inventory.get_ticket_type(cmd.ticket_type_ref).await?;
        if cmd.quantity > ticket_type.available_quantity {
            metrics::counter!("orders_rejected_insufficient_inventory_total").increment(1);
            return Err(OrchestratorError::InsufficientInventory {
                requested: cmd.quantity,
                available: ticket_type.available_quantity,
            });
        }

        // 2. The server-side total is authoritative.
        let total = ticket_type.unit_price.multiply(cmd.quantity);
        if let Some(claimed) = cmd.claimed_total
            && claimed != total
        {
            tracing::warn!(
                %claimed,
                %total,
                "client-supplied total does not match computed total, using computed"
            );
        }

        // 3. Passenger payload must at least be a well-formed array.
        let passenger_details =
            PassengerDetails::from_value(cmd.passenger_details, cmd.quantity)
                .map_err(|e| OrchestratorError::Validation(e.to_string()))?;

        // 4. Freeze the schedule snapshot; no order without one.
        let snapshot = self.snapshots.build(cmd.schedule_ref).await?;

        // 5. Persist in created/pending.
        let new_order = NewOrder {
            user_ref: cmd.user_ref,
            user_email_snapshot: cmd.user_email,
            schedule_ref: cmd.schedule_ref,
            schedule_snapshot: snapshot,
            ticket_type_ref: cmd.ticket_type_ref,
            ticket_type_name_snapshot: cmd.ticket_type_name,
            quantity: cmd.quantity,
            total_amount: total,
            payment_method: cmd.payment_method,
            passenger_details,
        };
        new_order.validate()?;
        let order = self.store.insert(new_order).await?;

        // 6. Reserve inventory. This is the one decrement for this
        // order; if it fails the order row is rolled back.
        if let Err(err) = self
            .inventory
            .decrement_quantity(order.ticket_type_ref, order.quantity)
            .await
        {
            tracing::warn!(order_id = %order.id, error = %err, "inventory reservation failed, rolling back order");
            if let Err(del_err) = self.store.delete(order.id).await {
                tracing::error!(order_id = %order.id, error = %del_err, "rollback delete failed");
            }
            return Err(err.into());
        }

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_create_duration_seconds").record(start.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, total = %order.total_amount, "order created");
        Ok(order)
    }

    /// Confirms payment for an order in `created`/`pending`.
    ///
    /// A collaborator outage leaves the order untouched so the caller
    /// can retry. A declined payment marks it `failed` and restores the
    /// reserved inventory.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_payment(&self, order_id: OrderId) -> Result<Order> {
        let mut order = self
            .store
            .get(order_id)
            .await?
            .ok_or(OrchestratorError::NotFound(order_id))?;

        if !order.order_status.can_confirm() {
            return Err(OrchestratorError::invalid_state(
                "confirm payment for",
                order.order_status,
            ));
        }
        // A declined payment released the reservation; the customer
        // must not be charged for tickets this order no longer holds.
        if order.payment_status != PaymentStatus::Pending {
            return Err(OrchestratorError::InvalidState(format!(
                "cannot confirm payment for an order whose payment is {}",
                order.payment_status
            )));
        }
        let expected = order.order_status;

        let outcome = self
            .payment
            .process_payment(order.id, order.total_amount, order.payment_method)
            .await?;

        if outcome.status.is_success() {
            order.confirm(Utc::now())?;
            self.store.update_if_status(expected, &order).await?;
            metrics::counter!("payments_confirmed_total").increment(1);
            tracing::info!(
                %order_id,
                transaction_id = outcome.transaction_id,
                "payment confirmed"
            );
            return Ok(order);
        }

        // Declined (or left pending by the gateway): the order keeps
        // its created status but the payment is marked failed, and the
        // reserved tickets go back.
        order.fail_payment()?;
        self.store.update_if_status(expected, &order).await?;
        metrics::counter!("payments_failed_total").increment(1);
        tracing::warn!(
            %order_id,
            status = ?outcome.status,
            message = %outcome.message,
            "payment not successful"
        );

        self.restore_inventory(&order, RestoreReason::PaymentFailed)
            .await?;
        Ok(order)
    }

    /// Cancels an order on behalf of its owner; a paid order is marked
    /// refunded.
    ///
    /// The cancellation stands even if the inventory restore fails; in
    /// that case the caller gets [`OrchestratorError::PartialFailure`]
    /// and the reconciler retries the owed restore.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId, requesting_user: UserId) -> Result<Order> {
        let mut order = self
            .store
            .get(order_id)
            .await?
            .ok_or(OrchestratorError::NotFound(order_id))?;

        if !order.is_owned_by(requesting_user) {
            return Err(OrchestratorError::Forbidden {
                user: requesting_user,
                order: order.id,
            });
        }
        if !order.order_status.can_cancel() {
            return Err(OrchestratorError::invalid_state(
                "cancel",
                order.order_status,
            ));
        }
        let expected = order.order_status;

        order.cancel()?;
        self.store.update_if_status(expected, &order).await?;
        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, payment_status = %order.payment_status, "order cancelled");

        let restored = self
            .restore_inventory(&order, RestoreReason::Cancelled)
            .await?;
        if !restored {
            return Err(OrchestratorError::PartialFailure { order: order.id });
        }
        Ok(order)
    }

    /// Fetches a single order.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get(order_id)
            .await?
            .ok_or(OrchestratorError::NotFound(order_id))
    }

    /// Lists every order, newest first.
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.store.list_all().await?)
    }

    /// Lists a user's orders, newest first.
    pub async fn list_user_orders(&self, user: UserId) -> Result<Vec<Order>> {
        Ok(self.store.list_for_user(user).await?)
    }

    /// Administrative hard delete. Bypasses the saga: no compensation
    /// runs and no inventory is restored.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<()> {
        self.store.delete(order_id).await?;
        tracing::info!(%order_id, "order deleted");
        Ok(())
    }

    /// Records the owed restore durably, then attempts it once.
    ///
    /// The order's inventory was decremented exactly once at creation,
    /// so one restore covers it no matter which operation records the
    /// entry. Claiming the entry before touching inventory keeps this
    /// orchestrator and the reconciler from both performing the same
    /// restore. Returns whether the restore is settled.
    async fn restore_inventory(&self, order: &Order, reason: RestoreReason) -> Result<bool> {
        match self.store.find_for_order(order.id).await? {
            Some(entry) if !entry.is_pending() => {
                tracing::debug!(
                    order_id = %order.id,
                    restored_by = %entry.reason,
                    "inventory already restored for this order"
                );
                return Ok(true);
            }
            Some(entry) if entry.reason != reason => {
                // An earlier operation recorded the restore and it has
                // not landed yet; the reconciler keeps retrying it.
                tracing::warn!(
                    order_id = %order.id,
                    owed_by = %entry.reason,
                    "inventory restore already owed"
                );
                return Ok(false);
            }
            Some(_) => {}
            None => {
                self.store
                    .record(order.id, reason, order.ticket_type_ref, order.quantity)
                    .await?;
            }
        }

        if !self.store.mark_restored(order.id, reason).await? {
            // Lost the claim to a concurrent worker.
            return Ok(true);
        }

        match self
            .inventory
            .increment_quantity(order.ticket_type_ref, order.quantity)
            .await
        {
            Ok(()) => {
                metrics::counter!("inventory_restores_total").increment(1);
                tracing::info!(order_id = %order.id, ?reason, "inventory restored");
                Ok(true)
            }
            Err(err) => {
                self.store.reopen(order.id, reason).await?;
                metrics::counter!("inventory_restores_owed_total").increment(1);
                tracing::warn!(
                    order_id = %order.id,
                    ?reason,
                    error = %err,
                    "inventory restore failed, left for reconciler"
                );
                Ok(false)
            }
        }
    }
}
