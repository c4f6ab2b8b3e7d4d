//! Shared identifier types for the ticket-order services.
//!
//! Each id is a thin newtype over `i64` so references to different
//! services cannot be mixed up at compile time.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from a raw integer value.
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i64>().map(Self)
            }
        }
    };
}

id_type! {
    /// Identifier of a persisted order, assigned by the order store.
    OrderId
}

id_type! {
    /// Weak reference to a user owned by the identity service.
    UserId
}

id_type! {
    /// Weak reference to a schedule owned by the schedule-catalog service.
    ScheduleId
}

id_type! {
    /// Weak reference to a ticket type owned by the inventory service.
    TicketTypeId
}
