//! Schedule catalog client, used to build order snapshots.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::ScheduleId;
use serde::Deserialize;

use crate::breaker::CircuitBreaker;
use crate::config::ClientsConfig;
use crate::error::ClientError;
use crate::Result;

const SERVICE: &str = "schedule";

/// Schedule facts as reported by the catalog service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInfo {
    pub train_number: String,
    pub origin_name: String,
    pub destination_name: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: String,
}

/// Operations the snapshot builder needs from the schedule catalog.
#[async_trait]
pub trait ScheduleClient: Send + Sync {
    /// Fetches the current facts for a schedule.
    async fn get_schedule(&self, id: ScheduleId) -> Result<ScheduleInfo>;
}

/// HTTP client for the schedule catalog, guarded by its own breaker.
#[derive(Debug, Clone)]
pub struct HttpScheduleClient {
    http: reqwest::Client,
    base_url: String,
    breaker: CircuitBreaker,
}

impl HttpScheduleClient {
    /// Builds a client from the shared configuration.
    pub fn new(config: &ClientsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.schedule_timeout)
            .build()
            .map_err(|e| ClientError::from_reqwest(SERVICE, e))?;
        Ok(Self {
            http,
            base_url: config.schedule_url.clone(),
            breaker: CircuitBreaker::new(SERVICE, config.breaker.clone()),
        })
    }

    /// The breaker guarding this client, for diagnostics.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

#[async_trait]
impl ScheduleClient for HttpScheduleClient {
    async fn get_schedule(&self, id: ScheduleId) -> Result<ScheduleInfo> {
        let url = format!("{}/api/schedules/{}", self.base_url, id);
        tracing::debug!(%id, "fetching schedule");
        self.breaker
            .call(|| async {
                let resp = self
                    .http
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| ClientError::from_reqwest(SERVICE, e))?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(ClientError::Status {
                        service: SERVICE,
                        status: status.as_u16(),
                    });
                }
                resp.json::<ScheduleInfo>()
                    .await
                    .map_err(|e| ClientError::from_reqwest(SERVICE, e))
            })
            .await
    }
}

#[derive(Debug, Default)]
struct InMemoryScheduleState {
    schedules: HashMap<ScheduleId, ScheduleInfo>,
    fail_on_get: bool,
}

/// In-memory schedule catalog for tests and the default binary.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScheduleClient {
    state: Arc<RwLock<InMemoryScheduleState>>,
}

impl InMemoryScheduleClient {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schedule to the catalog.
    pub fn add_schedule(&self, id: ScheduleId, info: ScheduleInfo) {
        self.state.write().unwrap().schedules.insert(id, info);
    }

    /// Configures the client to fail lookups.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.state.write().unwrap().fail_on_get = fail;
    }
}

#[async_trait]
impl ScheduleClient for InMemoryScheduleClient {
    async fn get_schedule(&self, id: ScheduleId) -> Result<ScheduleInfo> {
        let state = self.state.read().unwrap();
        if state.fail_on_get {
            return Err(ClientError::Transport {
                service: SERVICE,
                message: "connection refused".to_string(),
            });
        }
        state
            .schedules
            .get(&id)
            .cloned()
            .ok_or(ClientError::Status {
                service: SERVICE,
                status: 404,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_schedule() -> ScheduleInfo {
        ScheduleInfo {
            train_number: "SE1".to_string(),
            origin_name: "Ha Noi".to_string(),
            destination_name: "Da Nang".to_string(),
            departure_time: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
            arrival_time: Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap(),
            duration_minutes: 270,
            status: "scheduled".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_and_lookup() {
        let client = InMemoryScheduleClient::new();
        client.add_schedule(ScheduleId::new(10), sample_schedule());

        let info = client.get_schedule(ScheduleId::new(10)).await.unwrap();
        assert_eq!(info.train_number, "SE1");
        assert_eq!(info.duration_minutes, 270);
    }

    #[tokio::test]
    async fn test_missing_schedule_is_404() {
        let client = InMemoryScheduleClient::new();
        let err = client.get_schedule(ScheduleId::new(99)).await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fail_toggle() {
        let client = InMemoryScheduleClient::new();
        client.add_schedule(ScheduleId::new(10), sample_schedule());
        client.set_fail_on_get(true);

        let err = client.get_schedule(ScheduleId::new(10)).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }));
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = r#"{
            "trainNumber": "SE1",
            "originName": "Ha Noi",
            "destinationName": "Da Nang",
            "departureTime": "2026-03-01T08:00:00Z",
            "arrivalTime": "2026-03-01T12:30:00Z",
            "durationMinutes": 270,
            "status": "scheduled"
        }"#;
        let info: ScheduleInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.origin_name, "Ha Noi");
    }
}
