//! PostgreSQL integration tests for the order store.
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p order-store --test postgres_integration
//! ```
//!
//! Tests share one container and truncate tables between runs, so they
//! are serialized with `serial_test`.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::{OrderId, ScheduleId, TicketTypeId, UserId};
use domain::{
    Money, NewOrder, OrderStatus, PassengerDetails, PaymentMethod, PaymentStatus, ScheduleSnapshot,
};
use order_store::{OrderStore, PostgresOrderStore, RestoreLog, RestoreReason, StoreError};
use serde_json::json;
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/20260829000001_orders.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresOrderStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE orders, restore_log RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    PostgresOrderStore::new(pool)
}

fn sample_new_order(user: i64) -> NewOrder {
    let dep = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    let arr = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
    NewOrder {
        user_ref: UserId::new(user),
        user_email_snapshot: Some("an@example.com".to_string()),
        schedule_ref: ScheduleId::new(10),
        schedule_snapshot: ScheduleSnapshot::new("SE1", "Ha Noi", "Da Nang", dep, arr, 270),
        ticket_type_ref: TicketTypeId::new(5),
        ticket_type_name_snapshot: Some("Soft seat".to_string()),
        quantity: 3,
        total_amount: Money::from_cents(36000),
        payment_method: PaymentMethod::CreditCard,
        passenger_details: PassengerDetails::from_value(json!([{}, {}, {}]), 3).unwrap(),
    }
}

#[tokio::test]
#[serial]
async fn insert_and_get_roundtrip() {
    let store = get_test_store().await;

    let order = store.insert(sample_new_order(1)).await.unwrap();
    assert_eq!(order.order_status, OrderStatus::Created);
    assert_eq!(order.payment_status, PaymentStatus::Pending);

    let stored = store.get(order.id).await.unwrap().unwrap();
    assert_eq!(stored.total_amount, Money::from_cents(36000));
    assert_eq!(stored.schedule_snapshot.route, "Ha Noi - Da Nang");
    assert_eq!(stored.passenger_details.len(), 3);
    assert_eq!(stored.payment_method, PaymentMethod::CreditCard);
}

#[tokio::test]
#[serial]
async fn get_missing_order_returns_none() {
    let store = get_test_store().await;
    assert!(store.get(OrderId::new(404)).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn list_for_user_is_newest_first() {
    let store = get_test_store().await;

    let first = store.insert(sample_new_order(7)).await.unwrap();
    let _other = store.insert(sample_new_order(8)).await.unwrap();
    let second = store.insert(sample_new_order(7)).await.unwrap();

    let orders = store.list_for_user(UserId::new(7)).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, second.id);
    assert_eq!(orders[1].id, first.id);
}

#[tokio::test]
#[serial]
async fn conditional_update_applies_confirmation() {
    let store = get_test_store().await;

    let mut order = store.insert(sample_new_order(1)).await.unwrap();
    order.confirm(Utc::now()).unwrap();

    store
        .update_if_status(OrderStatus::Created, &order)
        .await
        .unwrap();

    let stored = store.get(order.id).await.unwrap().unwrap();
    assert_eq!(stored.order_status, OrderStatus::Confirmed);
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
    assert!(stored.confirmation_code.unwrap().starts_with("BK-"));
    assert!(stored.confirmed_at.is_some());
}

#[tokio::test]
#[serial]
async fn conditional_update_detects_lost_race() {
    let store = get_test_store().await;

    let order = store.insert(sample_new_order(1)).await.unwrap();

    let mut confirmed = order.clone();
    confirmed.confirm(Utc::now()).unwrap();
    store
        .update_if_status(OrderStatus::Created, &confirmed)
        .await
        .unwrap();

    let mut cancelled = order.clone();
    cancelled.cancel().unwrap();
    let err = store
        .update_if_status(OrderStatus::Created, &cancelled)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::StatusConflict {
            expected: OrderStatus::Created,
            actual: OrderStatus::Confirmed,
            ..
        }
    ));
}

#[tokio::test]
#[serial]
async fn conditional_update_missing_row_is_not_found() {
    let store = get_test_store().await;

    let order = store.insert(sample_new_order(1)).await.unwrap();
    store.delete(order.id).await.unwrap();

    let mut confirmed = order.clone();
    confirmed.confirm(Utc::now()).unwrap();
    let err = store
        .update_if_status(OrderStatus::Created, &confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
#[serial]
async fn delete_rolls_back_created_order() {
    let store = get_test_store().await;

    let order = store.insert(sample_new_order(1)).await.unwrap();
    store.delete(order.id).await.unwrap();
    assert!(store.get(order.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn restore_log_upsert_and_retire() {
    let store = get_test_store().await;

    let order = store.insert(sample_new_order(1)).await.unwrap();
    store
        .record(order.id, RestoreReason::Cancelled, order.ticket_type_ref, 3)
        .await
        .unwrap();
    // Duplicate key is a no-op.
    store
        .record(order.id, RestoreReason::Cancelled, order.ticket_type_ref, 3)
        .await
        .unwrap();

    let pending = store.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].quantity, 3);
    assert!(pending[0].is_pending());

    assert!(
        store
            .mark_restored(order.id, RestoreReason::Cancelled)
            .await
            .unwrap()
    );
    assert!(store.pending().await.unwrap().is_empty());

    // The claim is exclusive; a second claimer loses.
    assert!(
        !store
            .mark_restored(order.id, RestoreReason::Cancelled)
            .await
            .unwrap()
    );
}

#[tokio::test]
#[serial]
async fn restore_log_reopen_and_lookup() {
    let store = get_test_store().await;

    let order = store.insert(sample_new_order(1)).await.unwrap();
    store
        .record(
            order.id,
            RestoreReason::PaymentFailed,
            order.ticket_type_ref,
            3,
        )
        .await
        .unwrap();
    store
        .record(order.id, RestoreReason::Cancelled, order.ticket_type_ref, 3)
        .await
        .unwrap();

    assert!(
        store
            .mark_restored(order.id, RestoreReason::PaymentFailed)
            .await
            .unwrap()
    );

    // Lookup prefers the entry whose restore already completed.
    let entry = store.find_for_order(order.id).await.unwrap().unwrap();
    assert_eq!(entry.reason, RestoreReason::PaymentFailed);
    assert!(!entry.is_pending());

    // Reopening puts it back in the pending sweep and makes it
    // claimable again.
    store
        .reopen(order.id, RestoreReason::PaymentFailed)
        .await
        .unwrap();
    assert_eq!(store.pending().await.unwrap().len(), 2);
    assert!(
        store
            .mark_restored(order.id, RestoreReason::PaymentFailed)
            .await
            .unwrap()
    );

    assert!(
        store
            .find_for_order(OrderId::new(404))
            .await
            .unwrap()
            .is_none()
    );
}
