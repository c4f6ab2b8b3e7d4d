//! PostgreSQL-backed order store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ScheduleId, TicketTypeId, UserId};
use domain::{
    NewOrder, Order, OrderStatus, PassengerDetails, PaymentMethod, PaymentStatus, ScheduleSnapshot,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::StoreError;
use crate::store::{OrderStore, RestoreEntry, RestoreLog, RestoreReason};
use crate::Result;

/// PostgreSQL implementation of [`OrderStore`] and [`RestoreLog`].
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let snapshot_json: serde_json::Value = row.try_get("schedule_snapshot")?;
        let schedule_snapshot: ScheduleSnapshot = serde_json::from_value(snapshot_json)?;
        let passengers_json: serde_json::Value = row.try_get("passenger_details")?;
        let passenger_details: PassengerDetails = serde_json::from_value(passengers_json)?;

        let payment_method: PaymentMethod = row.try_get::<&str, _>("payment_method")?.parse()?;
        let payment_status: PaymentStatus = row.try_get::<&str, _>("payment_status")?.parse()?;
        let order_status: OrderStatus = row.try_get::<&str, _>("order_status")?.parse()?;

        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            user_ref: UserId::new(row.try_get("user_ref")?),
            user_email_snapshot: row.try_get("user_email_snapshot")?,
            schedule_ref: ScheduleId::new(row.try_get("schedule_ref")?),
            schedule_snapshot,
            ticket_type_ref: TicketTypeId::new(row.try_get("ticket_type_ref")?),
            ticket_type_name_snapshot: row.try_get("ticket_type_name_snapshot")?,
            quantity: row.try_get::<i32, _>("quantity")? as u32,
            total_amount: domain::Money::from_cents(row.try_get("total_amount_cents")?),
            payment_method,
            payment_status,
            order_status,
            passenger_details,
            confirmation_code: row.try_get("confirmation_code")?,
            created_at: row.try_get("created_at")?,
            confirmed_at: row.try_get("confirmed_at")?,
        })
    }

    fn row_to_restore_entry(row: PgRow) -> Result<RestoreEntry> {
        let reason: RestoreReason = row.try_get::<&str, _>("reason")?.parse()?;
        Ok(RestoreEntry {
            order_id: OrderId::new(row.try_get("order_id")?),
            reason,
            ticket_type_ref: TicketTypeId::new(row.try_get("ticket_type_ref")?),
            quantity: row.try_get::<i32, _>("quantity")? as u32,
            recorded_at: row.try_get("recorded_at")?,
            restored_at: row.try_get("restored_at")?,
        })
    }
}

const SELECT_ORDER: &str = r#"
SELECT id, user_ref, user_email_snapshot, schedule_ref, schedule_snapshot,
       ticket_type_ref, ticket_type_name_snapshot, quantity, total_amount_cents,
       payment_method, payment_status, order_status, passenger_details,
       confirmation_code, created_at, confirmed_at
FROM orders
"#;

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, new: NewOrder) -> Result<Order> {
        let snapshot_json = serde_json::to_value(&new.schedule_snapshot)?;
        let passengers_json = serde_json::to_value(&new.passenger_details)?;

        let row = sqlx::query(
            r#"
            INSERT INTO orders (
                user_ref, user_email_snapshot, schedule_ref, schedule_snapshot,
                ticket_type_ref, ticket_type_name_snapshot, quantity,
                total_amount_cents, payment_method, payment_status, order_status,
                passenger_details
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', 'created', $10)
            RETURNING id, created_at
            "#,
        )
        .bind(new.user_ref.value())
        .bind(&new.user_email_snapshot)
        .bind(new.schedule_ref.value())
        .bind(&snapshot_json)
        .bind(new.ticket_type_ref.value())
        .bind(&new.ticket_type_name_snapshot)
        .bind(new.quantity as i32)
        .bind(new.total_amount.cents())
        .bind(new.payment_method.as_str())
        .bind(&passengers_json)
        .fetch_one(&self.pool)
        .await?;

        let id = OrderId::new(row.try_get("id")?);
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        Ok(Order::from_new(new, id, created_at))
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("{SELECT_ORDER} WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!("{SELECT_ORDER} ORDER BY created_at DESC, id DESC"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "{SELECT_ORDER} WHERE user_ref = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user.value())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_if_status(&self, expected: OrderStatus, order: &Order) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET payment_status = $1, order_status = $2, confirmation_code = $3,
                confirmed_at = $4
            WHERE id = $5 AND order_status = $6
            "#,
        )
        .bind(order.payment_status.as_str())
        .bind(order.order_status.as_str())
        .bind(&order.confirmation_code)
        .bind(order.confirmed_at)
        .bind(order.id.value())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Distinguish a missing row from a lost race.
        match self.get(order.id).await? {
            None => Err(StoreError::NotFound(order.id)),
            Some(stored) => Err(StoreError::StatusConflict {
                id: order.id,
                expected,
                actual: stored.order_status,
            }),
        }
    }

    async fn delete(&self, id: OrderId) -> Result<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

#[async_trait]
impl RestoreLog for PostgresOrderStore {
    async fn record(
        &self,
        order_id: OrderId,
        reason: RestoreReason,
        ticket_type_ref: TicketTypeId,
        quantity: u32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO restore_log (order_id, reason, ticket_type_ref, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (order_id, reason) DO NOTHING
            "#,
        )
        .bind(order_id.value())
        .bind(reason.as_str())
        .bind(ticket_type_ref.value())
        .bind(quantity as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<RestoreEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, reason, ticket_type_ref, quantity, recorded_at, restored_at
            FROM restore_log
            WHERE restored_at IS NULL
            ORDER BY recorded_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_restore_entry).collect()
    }

    async fn find_for_order(&self, order_id: OrderId) -> Result<Option<RestoreEntry>> {
        // Completed entries sort first: `restored_at IS NULL` is false
        // for them and false orders before true.
        let row = sqlx::query(
            r#"
            SELECT order_id, reason, ticket_type_ref, quantity, recorded_at, restored_at
            FROM restore_log
            WHERE order_id = $1
            ORDER BY restored_at IS NULL, recorded_at
            LIMIT 1
            "#,
        )
        .bind(order_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_restore_entry).transpose()
    }

    async fn mark_restored(&self, order_id: OrderId, reason: RestoreReason) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE restore_log
            SET restored_at = now()
            WHERE order_id = $1 AND reason = $2 AND restored_at IS NULL
            "#,
        )
        .bind(order_id.value())
        .bind(reason.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn reopen(&self, order_id: OrderId, reason: RestoreReason) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE restore_log
            SET restored_at = NULL
            WHERE order_id = $1 AND reason = $2
            "#,
        )
        .bind(order_id.value())
        .bind(reason.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
