//! Order lifecycle endpoints.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use analytics::Analytics;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use clients::{InventoryClient, PaymentClient, ScheduleClient};
use common::{OrderId, UserId};
use domain::{Money, Order, PaymentMethod, ScheduleSnapshot};
use order_store::{OrderStore, RestoreLog};
use orchestrator::{CreateOrder, OrderOrchestrator};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S, I, P, Sc>
where
    S: OrderStore + RestoreLog,
    I: InventoryClient,
    P: PaymentClient,
    Sc: ScheduleClient,
{
    pub orchestrator: OrderOrchestrator<S, I, P, Sc>,
    pub analytics: Analytics<S>,
}

/// The authenticated caller, as asserted by the upstream gateway.
///
/// Authentication itself happens outside this service; the gateway
/// forwards the verified identity in the `x-user-id` header.
pub fn authenticated_user(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated("missing x-user-id header".to_string()))?;
    raw.parse::<UserId>()
        .map_err(|_| ApiError::Unauthenticated(format!("invalid x-user-id header: {raw}")))
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub schedule_id: i64,
    pub ticket_type_id: i64,
    pub ticket_type_name: Option<String>,
    pub quantity: u32,
    /// Client-side total, in cents. Recomputed server-side; kept only
    /// to detect and log stale client pricing.
    pub total_cents: Option<i64>,
    pub payment_method: String,
    pub email: Option<String>,
    #[serde(default = "empty_passenger_details")]
    pub passenger_details: serde_json::Value,
}

fn empty_passenger_details() -> serde_json::Value {
    serde_json::Value::Array(Vec::new())
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: i64,
    pub email: Option<String>,
    pub schedule_id: i64,
    pub schedule_snapshot: ScheduleSnapshot,
    pub ticket_type_id: i64,
    pub ticket_type_name: Option<String>,
    pub quantity: u32,
    pub total_cents: i64,
    pub payment_method: String,
    pub payment_status: String,
    pub order_status: String,
    pub passenger_details: Vec<serde_json::Value>,
    pub confirmation_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.value(),
            user_id: order.user_ref.value(),
            email: order.user_email_snapshot,
            schedule_id: order.schedule_ref.value(),
            schedule_snapshot: order.schedule_snapshot,
            ticket_type_id: order.ticket_type_ref.value(),
            ticket_type_name: order.ticket_type_name_snapshot,
            quantity: order.quantity,
            total_cents: order.total_amount.cents(),
            payment_method: order.payment_method.as_str().to_string(),
            payment_status: order.payment_status.as_str().to_string(),
            order_status: order.order_status.as_str().to_string(),
            passenger_details: order.passenger_details.records().to_vec(),
            confirmation_code: order.confirmation_code,
            created_at: order.created_at,
            confirmed_at: order.confirmed_at,
        }
    }
}

// -- Handlers --

/// POST /orders — run the create-order saga for the caller.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S, I, P, Sc>(
    State(state): State<Arc<AppState<S, I, P, Sc>>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError>
where
    S: OrderStore + RestoreLog,
    I: InventoryClient,
    P: PaymentClient,
    Sc: ScheduleClient,
{
    let user = authenticated_user(&headers)?;

    // Unknown payment methods are rejected here, never defaulted.
    let payment_method: PaymentMethod = req
        .payment_method
        .parse()
        .map_err(|e: domain::OrderError| ApiError::BadRequest(e.to_string()))?;

    let cmd = CreateOrder {
        user_ref: user,
        user_email: req.email,
        schedule_ref: req.schedule_id.into(),
        ticket_type_ref: req.ticket_type_id.into(),
        ticket_type_name: req.ticket_type_name,
        quantity: req.quantity,
        claimed_total: req.total_cents.map(Money::from_cents),
        payment_method,
        passenger_details: req.passenger_details,
    };

    let order = state.orchestrator.create_order(cmd).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders — list every order, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S, I, P, Sc>(
    State(state): State<Arc<AppState<S, I, P, Sc>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    S: OrderStore + RestoreLog,
    I: InventoryClient,
    P: PaymentClient,
    Sc: ScheduleClient,
{
    let orders = state.orchestrator.list_orders().await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/{id} — load one order.
#[tracing::instrument(skip(state))]
pub async fn get<S, I, P, Sc>(
    State(state): State<Arc<AppState<S, I, P, Sc>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: OrderStore + RestoreLog,
    I: InventoryClient,
    P: PaymentClient,
    Sc: ScheduleClient,
{
    let order = state.orchestrator.get_order(OrderId::new(id)).await?;
    Ok(Json(order.into()))
}

/// GET /orders/user/{user_id} — list a user's orders, newest first.
///
/// The caller may only read their own orders.
#[tracing::instrument(skip(state, headers))]
pub async fn list_for_user<S, I, P, Sc>(
    State(state): State<Arc<AppState<S, I, P, Sc>>>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    S: OrderStore + RestoreLog,
    I: InventoryClient,
    P: PaymentClient,
    Sc: ScheduleClient,
{
    let caller = authenticated_user(&headers)?;
    let requested = UserId::new(user_id);
    if caller != requested {
        return Err(ApiError::Forbidden(format!(
            "user {caller} cannot read orders of user {requested}"
        )));
    }

    let orders = state.orchestrator.list_user_orders(requested).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// POST /orders/{id}/confirm — confirm payment for an order.
#[tracing::instrument(skip(state))]
pub async fn confirm<S, I, P, Sc>(
    State(state): State<Arc<AppState<S, I, P, Sc>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: OrderStore + RestoreLog,
    I: InventoryClient,
    P: PaymentClient,
    Sc: ScheduleClient,
{
    let order = state.orchestrator.confirm_payment(OrderId::new(id)).await?;
    Ok(Json(order.into()))
}

/// POST /orders/{id}/cancel — cancel an order the caller owns.
#[tracing::instrument(skip(state, headers))]
pub async fn cancel<S, I, P, Sc>(
    State(state): State<Arc<AppState<S, I, P, Sc>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: OrderStore + RestoreLog,
    I: InventoryClient,
    P: PaymentClient,
    Sc: ScheduleClient,
{
    let caller = authenticated_user(&headers)?;
    let order = state
        .orchestrator
        .cancel_order(OrderId::new(id), caller)
        .await?;
    Ok(Json(order.into()))
}

/// DELETE /orders/{id} — administrative hard delete.
#[tracing::instrument(skip(state))]
pub async fn delete<S, I, P, Sc>(
    State(state): State<Arc<AppState<S, I, P, Sc>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
    S: OrderStore + RestoreLog,
    I: InventoryClient,
    P: PaymentClient,
    Sc: ScheduleClient,
{
    state.orchestrator.delete_order(OrderId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
