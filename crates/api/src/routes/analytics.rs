//! Read-only analytics endpoints.

use std::sync::Arc;

use analytics::{Breakdown, OrdersByDate, OrdersSummary, RevenueSummary};
use axum::Json;
use axum::extract::{Query, State};
use clients::{InventoryClient, PaymentClient, ScheduleClient};
use order_store::{OrderStore, RestoreLog};
use serde::Deserialize;

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct DaysQuery {
    /// Trailing window length; defaults to a week.
    pub days: Option<u32>,
}

/// GET /analytics/orders/summary
pub async fn orders_summary<S, I, P, Sc>(
    State(state): State<Arc<AppState<S, I, P, Sc>>>,
) -> Result<Json<OrdersSummary>, ApiError>
where
    S: OrderStore + RestoreLog,
    I: InventoryClient,
    P: PaymentClient,
    Sc: ScheduleClient,
{
    let summary = state
        .analytics
        .orders_summary()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(summary))
}

/// GET /analytics/revenue/summary
pub async fn revenue_summary<S, I, P, Sc>(
    State(state): State<Arc<AppState<S, I, P, Sc>>>,
) -> Result<Json<RevenueSummary>, ApiError>
where
    S: OrderStore + RestoreLog,
    I: InventoryClient,
    P: PaymentClient,
    Sc: ScheduleClient,
{
    let summary = state
        .analytics
        .revenue_summary()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(summary))
}

/// GET /analytics/orders/by-status
pub async fn orders_by_status<S, I, P, Sc>(
    State(state): State<Arc<AppState<S, I, P, Sc>>>,
) -> Result<Json<Breakdown>, ApiError>
where
    S: OrderStore + RestoreLog,
    I: InventoryClient,
    P: PaymentClient,
    Sc: ScheduleClient,
{
    let breakdown = state
        .analytics
        .orders_by_status()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(breakdown))
}

/// GET /analytics/orders/by-payment-method
pub async fn orders_by_payment_method<S, I, P, Sc>(
    State(state): State<Arc<AppState<S, I, P, Sc>>>,
) -> Result<Json<Breakdown>, ApiError>
where
    S: OrderStore + RestoreLog,
    I: InventoryClient,
    P: PaymentClient,
    Sc: ScheduleClient,
{
    let breakdown = state
        .analytics
        .orders_by_payment_method()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(breakdown))
}

/// GET /analytics/orders/by-date?days=N
pub async fn orders_by_date<S, I, P, Sc>(
    State(state): State<Arc<AppState<S, I, P, Sc>>>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<OrdersByDate>, ApiError>
where
    S: OrderStore + RestoreLog,
    I: InventoryClient,
    P: PaymentClient,
    Sc: ScheduleClient,
{
    let by_date = state
        .analytics
        .orders_by_date(query.days.unwrap_or(7))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(by_date))
}
