//! API server entry point.
//!
//! Storage and collaborator backends are selected from the environment:
//! - `DATABASE_URL` set — orders live in Postgres; otherwise in memory.
//! - `COLLABORATORS=http` — talk to the real inventory, payment and
//!   schedule services; otherwise use seeded in-memory stand-ins.

use std::sync::Arc;
use std::time::Duration;

use analytics::Analytics;
use api::config::Config;
use api::routes::orders::AppState;
use axum::Router;
use clients::{ClientsConfig, HttpInventoryClient, HttpPaymentClient, HttpScheduleClient};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryOrderStore, OrderStore, PostgresOrderStore, RestoreLog};
use orchestrator::{OrderOrchestrator, RestoreReconciler};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const RECONCILE_INTERVAL: Duration = Duration::from_secs(30);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Wires collaborators around the chosen store, spawns the restore
/// reconciler, and builds the router.
fn build_app<S>(store: S, metrics_handle: PrometheusHandle) -> Router
where
    S: OrderStore + RestoreLog + Clone + 'static,
{
    if std::env::var("COLLABORATORS").as_deref() == Ok("http") {
        let clients_config = ClientsConfig::from_env();
        let inventory =
            HttpInventoryClient::new(&clients_config).expect("failed to build inventory client");
        let payment =
            HttpPaymentClient::new(&clients_config).expect("failed to build payment client");
        let schedule =
            HttpScheduleClient::new(&clients_config).expect("failed to build schedule client");
        tracing::info!(
            inventory_url = %clients_config.inventory_url,
            payment_url = %clients_config.payment_url,
            schedule_url = %clients_config.schedule_url,
            "using http collaborators"
        );

        let orchestrator = OrderOrchestrator::new(
            store.clone(),
            inventory.clone(),
            payment,
            schedule,
        );
        let state = Arc::new(AppState {
            orchestrator,
            analytics: Analytics::new(store.clone()),
        });
        RestoreReconciler::new(store, inventory, RECONCILE_INTERVAL).spawn();
        api::create_app(state, metrics_handle)
    } else {
        tracing::info!("using seeded in-memory collaborators");
        let (state, inventory, _payment, _schedule) = api::create_default_state(store.clone());
        RestoreReconciler::new(store, inventory, RECONCILE_INTERVAL).spawn();
        api::create_app(state, metrics_handle)
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick the order store and build the application
    let app = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&database_url)
                .await
                .expect("failed to connect to Postgres");
            let store = PostgresOrderStore::new(pool);
            store.run_migrations().await.expect("migrations failed");
            tracing::info!("using Postgres order store");
            build_app(store, metrics_handle)
        }
        Err(_) => {
            tracing::info!("DATABASE_URL not set, using in-memory order store");
            build_app(InMemoryOrderStore::new(), metrics_handle)
        }
    };

    // 4. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
