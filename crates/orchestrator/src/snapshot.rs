//! Builds the immutable schedule snapshot attached to every order.

use clients::ScheduleClient;
use common::ScheduleId;
use domain::ScheduleSnapshot;

use crate::error::Result;

/// Resolves a schedule reference into a point-in-time copy.
///
/// No order is ever created without a snapshot: if the catalog is
/// unreachable the whole create operation fails.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder<S> {
    schedule: S,
}

impl<S: ScheduleClient> SnapshotBuilder<S> {
    /// Creates a builder over a schedule catalog client.
    pub fn new(schedule: S) -> Self {
        Self { schedule }
    }

    /// Fetches the schedule and freezes the fixed field set.
    pub async fn build(&self, id: ScheduleId) -> Result<ScheduleSnapshot> {
        let info = self.schedule.get_schedule(id).await?;
        Ok(ScheduleSnapshot::new(
            info.train_number,
            info.origin_name,
            info.destination_name,
            info.departure_time,
            info.arrival_time,
            i64::from(info.duration_minutes),
        ))
    }
}
