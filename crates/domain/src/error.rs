//! Domain error types.

use thiserror::Error;

use crate::order::status::{OrderStatus, PaymentStatus};

/// Errors raised by the order aggregate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Requested quantity must be strictly positive.
    #[error("Quantity must be greater than 0, got {0}")]
    InvalidQuantity(u32),

    /// Payment method string did not match a known variant.
    #[error("Unknown payment method: '{0}'")]
    UnknownPaymentMethod(String),

    /// Stored status string did not match a known variant.
    #[error("Unknown status value: '{0}'")]
    UnknownStatus(String),

    /// Passenger details payload was not a JSON array.
    #[error("Passenger details must be a JSON array")]
    MalformedPassengerDetails,

    /// Order status transition not allowed from the current status.
    #[error("Cannot {operation} an order in {current} status")]
    InvalidStatusTransition {
        operation: &'static str,
        current: OrderStatus,
    },

    /// Payment status transition not allowed from the current status.
    #[error("Cannot move payment status from {from} to {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },
}

/// Top-level domain error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Order aggregate error.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),
}
