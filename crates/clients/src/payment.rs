//! Payment service client.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::{Money, PaymentMethod};
use serde::{Deserialize, Serialize};

use crate::breaker::CircuitBreaker;
use crate::config::ClientsConfig;
use crate::error::ClientError;
use crate::Result;

const SERVICE: &str = "payment";

/// Outcome reported by the payment service.
///
/// A transport failure and a declined payment are different things: the
/// first is a [`ClientError`], the second is a successful call whose
/// `status` is [`PaymentCallStatus::Failed`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub transaction_id: i64,
    pub status: PaymentCallStatus,
    pub message: String,
}

/// Status reported by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentCallStatus {
    Success,
    Failed,
    Pending,
}

impl PaymentCallStatus {
    /// True only for a definitive successful charge.
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Operations the orchestrator needs from the payment service.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    /// Charges `amount` for the order with the given method.
    async fn process_payment(
        &self,
        order_id: OrderId,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<PaymentOutcome>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentRequest<'a> {
    order_id: OrderId,
    /// Amount in cents.
    amount: Money,
    payment_method: &'a str,
}

/// HTTP client for the payment service, guarded by its own breaker.
#[derive(Debug, Clone)]
pub struct HttpPaymentClient {
    http: reqwest::Client,
    base_url: String,
    breaker: CircuitBreaker,
}

impl HttpPaymentClient {
    /// Builds a client from the shared configuration.
    pub fn new(config: &ClientsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.payment_timeout)
            .build()
            .map_err(|e| ClientError::from_reqwest(SERVICE, e))?;
        Ok(Self {
            http,
            base_url: config.payment_url.clone(),
            breaker: CircuitBreaker::new(SERVICE, config.breaker.clone()),
        })
    }

    /// The breaker guarding this client, for diagnostics.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

#[async_trait]
impl PaymentClient for HttpPaymentClient {
    async fn process_payment(
        &self,
        order_id: OrderId,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<PaymentOutcome> {
        let url = format!("{}/api/payment/process", self.base_url);
        let request = PaymentRequest {
            order_id,
            amount,
            payment_method: method.as_str(),
        };
        tracing::debug!(%order_id, %amount, "processing payment");
        self.breaker
            .call(|| async {
                let resp = self
                    .http
                    .post(&url)
                    .json(&request)
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
                resp.json::<PaymentOutcome>()
                    .await
                    .map_err(|e| ClientError::from_reqwest(SERVICE, e))
            })
            .await
    }
}

#[derive(Debug)]
struct InMemoryPaymentState {
    next_status: PaymentCallStatus,
    fail_on_process: bool,
    next_transaction_id: i64,
    calls: u32,
}

impl Default for InMemoryPaymentState {
    fn default() -> Self {
        Self {
            next_status: PaymentCallStatus::Success,
            fail_on_process: false,
            next_transaction_id: 0,
            calls: 0,
        }
    }
}

/// In-memory payment client with scripted outcomes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentClient {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentClient {
    /// Creates a client that approves every payment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the status the gateway will report on subsequent calls.
    pub fn set_next_status(&self, status: PaymentCallStatus) {
        self.state.write().unwrap().next_status = status;
    }

    /// Configures the client to fail at the transport level.
    pub fn set_fail_on_process(&self, fail: bool) {
        self.state.write().unwrap().fail_on_process = fail;
    }

    /// Number of payment calls that reached the gateway.
    pub fn call_count(&self) -> u32 {
        self.state.read().unwrap().calls
    }
}

#[async_trait]
impl PaymentClient for InMemoryPaymentClient {
    async fn process_payment(
        &self,
        _order_id: OrderId,
        _amount: Money,
        _method: PaymentMethod,
    ) -> Result<PaymentOutcome> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_process {
            return Err(ClientError::Transport {
                service: SERVICE,
                message: "connection refused".to_string(),
            });
        }
        state.calls += 1;
        state.next_transaction_id += 1;
        let status = state.next_status;
        let message = match status {
            PaymentCallStatus::Success => "payment approved",
            PaymentCallStatus::Failed => "payment declined",
            PaymentCallStatus::Pending => "payment pending",
        };
        Ok(PaymentOutcome {
            transaction_id: state.next_transaction_id,
            status,
            message: message.to_string(),
        })
    }
}
