//! Order store and restore log traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, TicketTypeId, UserId};
use domain::{NewOrder, Order, OrderStatus};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Durable storage for the order aggregate.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order, assigning its id and creation timestamp.
    async fn insert(&self, new: NewOrder) -> Result<Order>;

    /// Loads an order by id.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists every stored order, newest first.
    async fn list_all(&self) -> Result<Vec<Order>>;

    /// Lists a user's orders, newest first.
    async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>>;

    /// Writes the order back only if its stored status still equals
    /// `expected`; otherwise fails with a status conflict.
    ///
    /// This is the guard that makes concurrent confirm/cancel on the
    /// same order race-free without a distributed lock.
    async fn update_if_status(&self, expected: OrderStatus, order: &Order) -> Result<()>;

    /// Removes an order row. Used for the create-order rollback and
    /// the administrative delete; bypasses status rules.
    async fn delete(&self, id: OrderId) -> Result<()>;
}

/// Why an inventory restore is owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreReason {
    /// Payment was declined after inventory had been decremented.
    PaymentFailed,
    /// The order was cancelled.
    Cancelled,
}

impl RestoreReason {
    /// Returns the reason as stored on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RestoreReason::PaymentFailed => "payment_failed",
            RestoreReason::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RestoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RestoreReason {
    type Err = domain::OrderError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "payment_failed" => Ok(RestoreReason::PaymentFailed),
            "cancelled" => Ok(RestoreReason::Cancelled),
            other => Err(domain::OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// A recorded "restore owed" entry.
///
/// The `(order_id, reason)` pair is the idempotency key: recording the
/// same pair twice is a no-op. An order's inventory is decremented
/// exactly once at creation, so across both reasons at most one entry
/// per order may ever be acted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreEntry {
    pub order_id: OrderId,
    pub reason: RestoreReason,
    pub ticket_type_ref: TicketTypeId,
    pub quantity: u32,
    pub recorded_at: DateTime<Utc>,
    pub restored_at: Option<DateTime<Utc>>,
}

impl RestoreEntry {
    /// Returns true if the restore has not been performed yet.
    pub fn is_pending(&self) -> bool {
        self.restored_at.is_none()
    }
}

/// Durable log of owed inventory restores.
///
/// Workers claim an entry through [`RestoreLog::mark_restored`] before
/// touching inventory; exactly one claimer wins, and a claim whose
/// restore attempt fails is put back with [`RestoreLog::reopen`].
#[async_trait]
pub trait RestoreLog: Send + Sync {
    /// Records that a restore is owed. Idempotent on
    /// `(order_id, reason)`.
    async fn record(
        &self,
        order_id: OrderId,
        reason: RestoreReason,
        ticket_type_ref: TicketTypeId,
        quantity: u32,
    ) -> Result<()>;

    /// Returns all entries whose restore has not happened yet.
    async fn pending(&self) -> Result<Vec<RestoreEntry>>;

    /// Looks up the restore entry recorded for an order under any
    /// reason, preferring one whose restore already completed.
    async fn find_for_order(&self, order_id: OrderId) -> Result<Option<RestoreEntry>>;

    /// Atomically claims a pending entry by marking it restored.
    /// Returns false when the entry is missing or already claimed.
    async fn mark_restored(&self, order_id: OrderId, reason: RestoreReason) -> Result<bool>;

    /// Puts a claimed entry back to pending after a failed restore
    /// attempt, so the reconciler picks it up again.
    async fn reopen(&self, order_id: OrderId, reason: RestoreReason) -> Result<()>;
}
