//! In-memory order store for tests and the default binary.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, TicketTypeId, UserId};
use domain::{NewOrder, Order, OrderStatus};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::{OrderStore, RestoreEntry, RestoreLog, RestoreReason};
use crate::Result;

#[derive(Default)]
struct InMemoryState {
    orders: BTreeMap<OrderId, Order>,
    restores: HashMap<(OrderId, RestoreReason), RestoreEntry>,
    next_id: i64,
}

/// In-memory implementation of [`OrderStore`] and [`RestoreLog`].
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryOrderStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of restore entries, pending or done.
    pub async fn restore_entry_count(&self) -> usize {
        self.state.read().await.restores.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, new: NewOrder) -> Result<Order> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let order = Order::from_new(new, OrderId::new(state.next_id), Utc::now());
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.user_ref == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn update_if_status(&self, expected: OrderStatus, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .orders
            .get_mut(&order.id)
            .ok_or(StoreError::NotFound(order.id))?;

        if stored.order_status != expected {
            return Err(StoreError::StatusConflict {
                id: order.id,
                expected,
                actual: stored.order_status,
            });
        }

        *stored = order.clone();
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}

#[async_trait]
impl RestoreLog for InMemoryOrderStore {
    async fn record(
        &self,
        order_id: OrderId,
        reason: RestoreReason,
        ticket_type_ref: TicketTypeId,
        quantity: u32,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .restores
            .entry((order_id, reason))
            .or_insert_with(|| RestoreEntry {
                order_id,
                reason,
                ticket_type_ref,
                quantity,
                recorded_at: Utc::now(),
                restored_at: None,
            });
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<RestoreEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<RestoreEntry> = state
            .restores
            .values()
            .filter(|e| e.is_pending())
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.recorded_at);
        Ok(entries)
    }

    async fn find_for_order(&self, order_id: OrderId) -> Result<Option<RestoreEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<&RestoreEntry> = state
            .restores
            .values()
            .filter(|e| e.order_id == order_id)
            .collect();
        // Completed entries first, then oldest recorded.
        entries.sort_by_key(|e| (e.restored_at.is_none(), e.recorded_at));
        Ok(entries.first().map(|e| (*e).clone()))
    }

    async fn mark_restored(&self, order_id: OrderId, reason: RestoreReason) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.restores.get_mut(&(order_id, reason)) {
            Some(entry) if entry.restored_at.is_none() => {
                entry.restored_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reopen(&self, order_id: OrderId, reason: RestoreReason) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(entry) = state.restores.get_mut(&(order_id, reason)) {
            entry.restored_at = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use domain::{Money, PassengerDetails, PaymentMethod, ScheduleSnapshot};
    use serde_json::json;

    fn sample_new_order(user: i64) -> NewOrder {
        let dep = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let arr = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        NewOrder {
            user_ref: UserId::new(user),
            user_email_snapshot: None,
            schedule_ref: common::ScheduleId::new(10),
            schedule_snapshot: ScheduleSnapshot::new("SE1", "Ha Noi", "Da Nang", dep, arr, 270),
            ticket_type_ref: TicketTypeId::new(5),
            ticket_type_name_snapshot: None,
            quantity: 2,
            total_amount: Money::from_cents(24000),
            payment_method: PaymentMethod::Cash,
            passenger_details: PassengerDetails::from_value(json!([{}, {}]), 2).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryOrderStore::new();
        let o1 = store.insert(sample_new_order(1)).await.unwrap();
        let o2 = store.insert(sample_new_order(1)).await.unwrap();
        assert_eq!(o1.id, OrderId::new(1));
        assert_eq!(o2.id, OrderId::new(2));
        assert_eq!(store.order_count().await, 2);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = InMemoryOrderStore::new();
        assert!(store.get(OrderId::new(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_for_user_filters_and_sorts_newest_first() {
        let store = InMemoryOrderStore::new();
        let a = store.insert(sample_new_order(1)).await.unwrap();
        let _other = store.insert(sample_new_order(2)).await.unwrap();
        let b = store.insert(sample_new_order(1)).await.unwrap();

        let orders = store.list_for_user(UserId::new(1)).await.unwrap();
        assert_eq!(orders.len(), 2);
        // Newest (latest insert) first.
        assert_eq!(orders[0].id, b.id);
        assert_eq!(orders[1].id, a.id);
    }

    #[tokio::test]
    async fn test_conditional_update_succeeds_on_matching_status() {
        let store = InMemoryOrderStore::new();
        let mut order = store.insert(sample_new_order(1)).await.unwrap();
        order.confirm(Utc::now()).unwrap();

        store
            .update_if_status(OrderStatus::Created, &order)
            .await
            .unwrap();

        let stored = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.order_status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_conditional_update_rejects_stale_status() {
        let store = InMemoryOrderStore::new();
        let mut order = store.insert(sample_new_order(1)).await.unwrap();

        // First writer wins.
        let mut confirmed = order.clone();
        confirmed.confirm(Utc::now()).unwrap();
        store
            .update_if_status(OrderStatus::Created, &confirmed)
            .await
            .unwrap();

        // Second writer raced on the same precondition and loses.
        order.cancel().unwrap();
        let err = store
            .update_if_status(OrderStatus::Created, &order)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::StatusConflict {
                expected: OrderStatus::Created,
                actual: OrderStatus::Confirmed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let store = InMemoryOrderStore::new();
        let order = store.insert(sample_new_order(1)).await.unwrap();
        store.delete(order.id).await.unwrap();
        assert!(store.get(order.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete(order.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_restore_log_is_idempotent_per_key() {
        let store = InMemoryOrderStore::new();
        let id = OrderId::new(1);
        let tt = TicketTypeId::new(5);

        store
            .record(id, RestoreReason::Cancelled, tt, 2)
            .await
            .unwrap();
        store
            .record(id, RestoreReason::Cancelled, tt, 2)
            .await
            .unwrap();

        assert_eq!(store.restore_entry_count().await, 1);
        assert_eq!(store.pending().await.unwrap().len(), 1);

        assert!(store.mark_restored(id, RestoreReason::Cancelled).await.unwrap());
        assert!(store.pending().await.unwrap().is_empty());

        // The claim is exclusive; a retired entry never flips back.
        assert!(!store.mark_restored(id, RestoreReason::Cancelled).await.unwrap());
        assert!(store.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reopen_makes_entry_claimable_again() {
        let store = InMemoryOrderStore::new();
        let id = OrderId::new(1);
        let tt = TicketTypeId::new(5);

        store
            .record(id, RestoreReason::Cancelled, tt, 2)
            .await
            .unwrap();
        assert!(store.mark_restored(id, RestoreReason::Cancelled).await.unwrap());

        store.reopen(id, RestoreReason::Cancelled).await.unwrap();
        assert_eq!(store.pending().await.unwrap().len(), 1);
        assert!(store.mark_restored(id, RestoreReason::Cancelled).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_for_order_prefers_completed_entry() {
        let store = InMemoryOrderStore::new();
        let id = OrderId::new(1);
        let tt = TicketTypeId::new(5);

        store
            .record(id, RestoreReason::PaymentFailed, tt, 2)
            .await
            .unwrap();
        store
            .record(id, RestoreReason::Cancelled, tt, 2)
            .await
            .unwrap();
        assert!(
            store
                .mark_restored(id, RestoreReason::PaymentFailed)
                .await
                .unwrap()
        );

        let entry = store.find_for_order(id).await.unwrap().unwrap();
        assert_eq!(entry.reason, RestoreReason::PaymentFailed);
        assert!(!entry.is_pending());

        assert!(store.find_for_order(OrderId::new(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_entries_keyed_per_operation() {
        let store = InMemoryOrderStore::new();
        let id = OrderId::new(1);
        let tt = TicketTypeId::new(5);

        store
            .record(id, RestoreReason::PaymentFailed, tt, 2)
            .await
            .unwrap();
        store
            .record(id, RestoreReason::Cancelled, tt, 2)
            .await
            .unwrap();

        assert_eq!(store.pending().await.unwrap().len(), 2);
    }
}
