//! HTTP API server for the order lifecycle service.
//!
//! Exposes the order saga, user-facing reads, and analytics over REST,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use analytics::Analytics;
use axum::Router;
use axum::routing::{delete, get, post};
use chrono::{Duration, Utc};
use clients::{
    InMemoryInventoryClient, InMemoryPaymentClient, InMemoryScheduleClient, InventoryClient,
    PaymentClient, ScheduleClient, ScheduleInfo,
};
use common::{ScheduleId, TicketTypeId};
use domain::Money;
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{OrderStore, RestoreLog};
use orchestrator::OrderOrchestrator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Application state backed by in-memory collaborators.
pub type DefaultAppState<S> =
    AppState<S, InMemoryInventoryClient, InMemoryPaymentClient, InMemoryScheduleClient>;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, I, P, Sc>(
    state: Arc<AppState<S, I, P, Sc>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: OrderStore + RestoreLog + 'static,
    I: InventoryClient + 'static,
    P: PaymentClient + 'static,
    Sc: ScheduleClient + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S, I, P, Sc>))
        .route("/orders", get(routes::orders::list::<S, I, P, Sc>))
        .route("/orders/{id}", get(routes::orders::get::<S, I, P, Sc>))
        .route(
            "/orders/{id}",
            delete(routes::orders::delete::<S, I, P, Sc>),
        )
        .route(
            "/orders/user/{user_id}",
            get(routes::orders::list_for_user::<S, I, P, Sc>),
        )
        .route(
            "/orders/{id}/confirm",
            post(routes::orders::confirm::<S, I, P, Sc>),
        )
        .route(
            "/orders/{id}/cancel",
            post(routes::orders::cancel::<S, I, P, Sc>),
        )
        .route(
            "/analytics/orders/summary",
            get(routes::analytics::orders_summary::<S, I, P, Sc>),
        )
        .route(
            "/analytics/revenue/summary",
            get(routes::analytics::revenue_summary::<S, I, P, Sc>),
        )
        .route(
            "/analytics/orders/by-status",
            get(routes::analytics::orders_by_status::<S, I, P, Sc>),
        )
        .route(
            "/analytics/orders/by-payment-method",
            get(routes::analytics::orders_by_payment_method::<S, I, P, Sc>),
        )
        .route(
            "/analytics/orders/by-date",
            get(routes::analytics::orders_by_date::<S, I, P, Sc>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over in-memory collaborators, seeded with
/// a small demo catalog.
///
/// Returns the collaborator handles alongside the state so callers
/// (tests, the demo binary) can adjust stock and script outcomes.
pub fn create_default_state<S>(
    store: S,
) -> (
    Arc<DefaultAppState<S>>,
    InMemoryInventoryClient,
    InMemoryPaymentClient,
    InMemoryScheduleClient,
)
where
    S: OrderStore + RestoreLog + Clone + 'static,
{
    let inventory = InMemoryInventoryClient::new();
    let payment = InMemoryPaymentClient::new();
    let schedule = InMemoryScheduleClient::new();

    inventory.stock(TicketTypeId::new(1), Money::from_cents(12000), 100);
    inventory.stock(TicketTypeId::new(2), Money::from_cents(45000), 40);
    let departure = Utc::now() + Duration::days(7);
    schedule.add_schedule(
        ScheduleId::new(1),
        ScheduleInfo {
            train_number: "SE1".to_string(),
            origin_name: "Ha Noi".to_string(),
            destination_name: "Da Nang".to_string(),
            departure_time: departure,
            arrival_time: departure + Duration::minutes(270),
            duration_minutes: 270,
            status: "scheduled".to_string(),
        },
    );

    let orchestrator = OrderOrchestrator::new(
        store.clone(),
        inventory.clone(),
        payment.clone(),
        schedule.clone(),
    );
    let state = Arc::new(AppState {
        orchestrator,
        analytics: Analytics::new(store),
    });

    (state, inventory, payment, schedule)
}
