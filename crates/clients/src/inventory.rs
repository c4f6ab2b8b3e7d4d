//! Inventory service client: ticket type lookups and quantity changes.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::TicketTypeId;
use domain::Money;
use serde::Deserialize;

use crate::breaker::CircuitBreaker;
use crate::config::ClientsConfig;
use crate::error::ClientError;
use crate::Result;

const SERVICE: &str = "inventory";

/// Ticket type facts as reported by the inventory service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketTypeInfo {
    /// Price per ticket, in cents.
    #[serde(rename = "price")]
    pub unit_price: Money,
    pub available_quantity: u32,
    pub status: String,
}

/// Operations the orchestrator needs from the inventory service.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Fetches price and availability for a ticket type.
    async fn get_ticket_type(&self, id: TicketTypeId) -> Result<TicketTypeInfo>;

    /// Reserves `quantity` tickets by decrementing availability.
    async fn decrement_quantity(&self, id: TicketTypeId, quantity: u32) -> Result<()>;

    /// Restores `quantity` tickets by incrementing availability.
    async fn increment_quantity(&self, id: TicketTypeId, quantity: u32) -> Result<()>;
}

/// HTTP client for the inventory service, guarded by its own breaker.
#[derive(Debug, Clone)]
pub struct HttpInventoryClient {
    http: reqwest::Client,
    base_url: String,
    breaker: CircuitBreaker,
}

impl HttpInventoryClient {
    /// Builds a client from the shared configuration.
    pub fn new(config: &ClientsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.inventory_timeout)
            .build()
            .map_err(|e| ClientError::from_reqwest(SERVICE, e))?;
        Ok(Self {
            http,
            base_url: config.inventory_url.clone(),
            breaker: CircuitBreaker::new(SERVICE, config.breaker.clone()),
        })
    }

    /// The breaker guarding this client, for diagnostics.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn put_quantity(&self, id: TicketTypeId, action: &str, quantity: u32) -> Result<()> {
        let url = format!(
            "{}/api/tickets/{}/{}?quantity={}",
            self.base_url, id, action, quantity
        );
        self.breaker
            .call(|| async {
                let resp = self
                    .http
                    .put(&url)
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
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    async fn get_ticket_type(&self, id: TicketTypeId) -> Result<TicketTypeInfo> {
        let url = format!("{}/api/tickets/{}", self.base_url, id);
        tracing::debug!(%id, "fetching ticket type");
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
                resp.json::<TicketTypeInfo>()
                    .await
                    .map_err(|e| ClientError::from_reqwest(SERVICE, e))
            })
            .await
    }

    async fn decrement_quantity(&self, id: TicketTypeId, quantity: u32) -> Result<()> {
        tracing::debug!(%id, quantity, "decrementing ticket quantity");
        self.put_quantity(id, "decrease-quantity", quantity).await
    }

    async fn increment_quantity(&self, id: TicketTypeId, quantity: u32) -> Result<()> {
        tracing::debug!(%id, quantity, "incrementing ticket quantity");
        self.put_quantity(id, "increase-quantity", quantity).await
    }
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    ticket_types: HashMap<TicketTypeId, TicketTypeInfo>,
    fail_on_get: bool,
    fail_on_decrement: bool,
    fail_on_increment: bool,
}

/// In-memory inventory client for tests and the default binary.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryClient {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryClient {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stocks a ticket type with a unit price and available quantity.
    pub fn stock(&self, id: TicketTypeId, unit_price: Money, available: u32) {
        self.state.write().unwrap().ticket_types.insert(
            id,
            TicketTypeInfo {
                unit_price,
                available_quantity: available,
                status: "active".to_string(),
            },
        );
    }

    /// Returns the current available quantity for a ticket type.
    pub fn available_quantity(&self, id: TicketTypeId) -> Option<u32> {
        self.state
            .read()
            .unwrap()
            .ticket_types
            .get(&id)
            .map(|t| t.available_quantity)
    }

    /// Configures the client to fail lookups.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.state.write().unwrap().fail_on_get = fail;
    }

    /// Configures the client to fail decrements.
    pub fn set_fail_on_decrement(&self, fail: bool) {
        self.state.write().unwrap().fail_on_decrement = fail;
    }

    /// Configures the client to fail increments.
    pub fn set_fail_on_increment(&self, fail: bool) {
        self.state.write().unwrap().fail_on_increment = fail;
    }

    fn unreachable_err() -> ClientError {
        ClientError::Transport {
            service: SERVICE,
            message: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl InventoryClient for InMemoryInventoryClient {
    async fn get_ticket_type(&self, id: TicketTypeId) -> Result<TicketTypeInfo> {
        let state = self.state.read().unwrap();
        if state.fail_on_get {
            return Err(Self::unreachable_err());
        }
        state
            .ticket_types
            .get(&id)
            .cloned()
            .ok_or(ClientError::Status {
                service: SERVICE,
                status: 404,
            })
    }

    async fn decrement_quantity(&self, id: TicketTypeId, quantity: u32) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_decrement {
            return Err(Self::unreachable_err());
        }
        let info = state
            .ticket_types
            .get_mut(&id)
            .ok_or(ClientError::Status {
                service: SERVICE,
                status: 404,
            })?;
        if info.available_quantity < quantity {
            return Err(ClientError::Status {
                service: SERVICE,
                status: 409,
            });
        }
        info.available_quantity -= quantity;
        Ok(())
    }

    async fn increment_quantity(&self, id: TicketTypeId, quantity: u32) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_increment {
            return Err(Self::unreachable_err());
        }
        let info = state
            .ticket_types
            .get_mut(&id)
            .ok_or(ClientError::Status {
                service: SERVICE,
                status: 404,
            })?;
        info.available_quantity += quantity;
        Ok(())
    }
}
