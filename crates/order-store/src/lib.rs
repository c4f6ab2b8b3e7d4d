//! Persistence for the order aggregate.
//!
//! The order row is the only durable source of truth for order
//! progress; the orchestrator is its only writer. Status updates go
//! through a conditional write ([`OrderStore::update_if_status`]) so a
//! concurrent confirm/cancel pair cannot both win.
//!
//! The [`RestoreLog`] records inventory restores still owed after a
//! payment failure or cancellation, keyed per order and operation so a
//! restore happens at most once.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::StoreError;
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use store::{OrderStore, RestoreEntry, RestoreLog, RestoreReason};

/// Convenience result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
