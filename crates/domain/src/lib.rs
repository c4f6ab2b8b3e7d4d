//! Domain layer for the order lifecycle.
//!
//! The [`Order`] aggregate is the single durable source of truth for a
//! booking. All status mutations go through aggregate methods that
//! enforce the monotonic transition rules; callers never flip status
//! fields directly.

pub mod error;
pub mod order;

pub use error::{DomainError, OrderError};
pub use order::aggregate::{NewOrder, Order};
pub use order::snapshot::ScheduleSnapshot;
pub use order::status::{OrderStatus, PaymentMethod, PaymentStatus};
pub use order::value_objects::{Money, PassengerDetails};
