//! Store error types.

use common::OrderId;
use domain::OrderStatus;
use thiserror::Error;

/// Errors that can occur in the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order exists with the given id.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// A conditional update lost against a concurrent writer.
    #[error("Order {id} status conflict: expected {expected}, found {actual}")]
    StatusConflict {
        id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// Stored payload could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored status/method text did not parse.
    #[error("Corrupt stored value: {0}")]
    Corrupt(#[from] domain::OrderError),

    /// Underlying database failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
