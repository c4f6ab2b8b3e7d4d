//! Orchestrator error taxonomy.
//!
//! Every failure a caller can see is one of these variants; transport
//! and storage details are mapped at the boundary and never leak.

use clients::ClientError;
use common::{OrderId, UserId};
use domain::{OrderError, OrderStatus};
use order_store::StoreError;
use thiserror::Error;

/// Errors surfaced by order lifecycle operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Bad input; the caller can retry with a corrected request.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Business rejection; not retryable without changing the request.
    #[error("insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory { requested: u32, available: u32 },

    /// No order with this id.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// The requesting user does not own the order.
    #[error("user {user} does not own order {order}")]
    Forbidden { user: UserId, order: OrderId },

    /// Operation not valid for the order's current status.
    #[error("invalid order state: {0}")]
    InvalidState(String),

    /// A collaborator is unreachable or its breaker is open; retryable.
    #[error("upstream service unavailable: {0}")]
    UpstreamUnavailable(#[from] ClientError),

    /// The primary transition committed but a compensating action did
    /// not; the reconciler retries the leftover work.
    #[error("order {order} cancelled but inventory restore failed; restore is owed and will be retried")]
    PartialFailure { order: OrderId },

    /// Storage failure unrelated to any precondition.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for OrchestratorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::StatusConflict {
                id,
                expected,
                actual,
            } => Self::InvalidState(format!(
                "order {id} changed concurrently: expected {expected}, found {actual}"
            )),
            other => Self::Store(other),
        }
    }
}

impl From<OrderError> for OrchestratorError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidStatusTransition { operation, current } => {
                Self::InvalidState(format!("cannot {operation} an order in status {current}"))
            }
            OrderError::InvalidPaymentTransition { from, to } => {
                Self::InvalidState(format!("cannot move payment from {from} to {to}"))
            }
            other => Self::Validation(other.to_string()),
        }
    }
}

impl OrchestratorError {
    pub(crate) fn invalid_state(operation: &str, status: OrderStatus) -> Self {
        Self::InvalidState(format!(
            "cannot {operation} an order in status {status}"
        ))
    }
}

/// Convenience type alias for orchestrator results.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
