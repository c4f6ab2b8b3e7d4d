//! Typed clients for the three collaborator services.
//!
//! Each HTTP client owns an independent circuit breaker, so a failing
//! payment gateway never blocks inventory calls. All transport failures
//! are normalized to [`ClientError`] before they leave this crate.

pub mod breaker;
pub mod config;
pub mod error;
pub mod inventory;
pub mod payment;
pub mod schedule;

pub use breaker::{BreakerConfig, BreakerState, CircuitBreaker};
pub use config::ClientsConfig;
pub use error::ClientError;
pub use inventory::{HttpInventoryClient, InMemoryInventoryClient, InventoryClient, TicketTypeInfo};
pub use payment::{
    HttpPaymentClient, InMemoryPaymentClient, PaymentCallStatus, PaymentClient, PaymentOutcome,
};
pub use schedule::{HttpScheduleClient, InMemoryScheduleClient, ScheduleClient, ScheduleInfo};

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ClientError>;
