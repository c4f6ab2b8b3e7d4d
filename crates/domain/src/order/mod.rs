//! The order aggregate and its supporting types.

pub mod aggregate;
pub mod snapshot;
pub mod status;
pub mod value_objects;
