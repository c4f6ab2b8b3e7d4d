//! Order lifecycle orchestration.
//!
//! Coordinates order creation, payment confirmation, and cancellation
//! across the inventory, payment, and schedule collaborators. Every
//! owed compensation is recorded durably before it is attempted, and a
//! background reconciler retries the ones that did not land.

pub mod coordinator;
pub mod error;
pub mod reconciler;
pub mod snapshot;

pub use coordinator::{CreateOrder, OrderOrchestrator};
pub use error::{OrchestratorError, Result};
pub use reconciler::RestoreReconciler;
pub use snapshot::SnapshotBuilder;
