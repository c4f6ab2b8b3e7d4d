//! Point-in-time schedule snapshot embedded in an order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Denormalized copy of the referenced schedule, frozen at order
/// creation.
///
/// The order must stay legible even if the upstream schedule is later
/// edited or deleted, so this is a copy and never a live reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    pub train_number: String,
    pub origin_name: String,
    pub destination_name: String,
    /// Combined "origin - destination" label for display.
    pub route: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl ScheduleSnapshot {
    /// Builds a snapshot from schedule facts, deriving the route label.
    pub fn new(
        train_number: impl Into<String>,
        origin_name: impl Into<String>,
        destination_name: impl Into<String>,
        departure_time: DateTime<Utc>,
        arrival_time: DateTime<Utc>,
        duration_minutes: i64,
    ) -> Self {
        let origin_name = origin_name.into();
        let destination_name = destination_name.into();
        let route = format!("{origin_name} - {destination_name}");
        Self {
            train_number: train_number.into(),
            origin_name,
            destination_name,
            route,
            departure_time,
            arrival_time,
            duration_minutes,
        }
    }
}
