//! Read-only aggregate views over the order store.
//!
//! These queries sit off the consistency path: they fold over whatever
//! the store currently holds and never write anything.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use domain::{Money, OrderStatus, PaymentStatus};
use order_store::{OrderStore, Result};
use serde::Serialize;

/// Counts of orders per lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersSummary {
    pub total_orders: usize,
    pub confirmed_orders: u64,
    pub cancelled_orders: u64,
    /// Orders still in `created`, awaiting payment.
    pub pending_orders: u64,
}

/// Revenue totals split by payment status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    /// Sum of totals across paid orders, in cents.
    pub total_revenue: Money,
    /// Sum of totals across orders still pending payment, in cents.
    pub pending_revenue: Money,
    pub paid_orders: u64,
    pub pending_payments: u64,
}

/// A labelled count breakdown plus the overall order count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    pub data: BTreeMap<String, u64>,
    pub total: usize,
}

/// Daily order creation counts over a trailing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrdersByDate {
    pub data: BTreeMap<NaiveDate, u64>,
    /// Human-readable window, e.g. `"7 days"`.
    pub period: String,
}

/// Aggregation queries over a shared order store.
#[derive(Debug, Clone)]
pub struct Analytics<S> {
    store: S,
}

impl<S: OrderStore> Analytics<S> {
    /// Creates the analytics view over a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Order counts by lifecycle status.
    pub async fn orders_summary(&self) -> Result<OrdersSummary> {
        let orders = self.store.list_all().await?;
        let count_status = |status: OrderStatus| {
            orders.iter().filter(|o| o.order_status == status).count() as u64
        };
        Ok(OrdersSummary {
            total_orders: orders.len(),
            confirmed_orders: count_status(OrderStatus::Confirmed),
            cancelled_orders: count_status(OrderStatus::Cancelled),
            pending_orders: count_status(OrderStatus::Created),
        })
    }

    /// Paid and pending revenue totals.
    pub async fn revenue_summary(&self) -> Result<RevenueSummary> {
        let orders = self.store.list_all().await?;
        let mut summary = RevenueSummary {
            total_revenue: Money::zero(),
            pending_revenue: Money::zero(),
            paid_orders: 0,
            pending_payments: 0,
        };
        for order in &orders {
            match order.payment_status {
                PaymentStatus::Paid => {
                    summary.total_revenue += order.total_amount;
                    summary.paid_orders += 1;
                }
                PaymentStatus::Pending => {
                    summary.pending_revenue += order.total_amount;
                    summary.pending_payments += 1;
                }
                PaymentStatus::Failed | PaymentStatus::Refunded => {}
            }
        }
        Ok(summary)
    }

    /// Order counts keyed by order status.
    pub async fn orders_by_status(&self) -> Result<Breakdown> {
        let orders = self.store.list_all().await?;
        let mut data: BTreeMap<String, u64> = BTreeMap::new();
        for order in &orders {
            *data.entry(order.order_status.as_str().to_string()).or_default() += 1;
        }
        Ok(Breakdown {
            total: orders.len(),
            data,
        })
    }

    /// Order counts keyed by payment method.
    pub async fn orders_by_payment_method(&self) -> Result<Breakdown> {
        let orders = self.store.list_all().await?;
        let mut data: BTreeMap<String, u64> = BTreeMap::new();
        for order in &orders {
            *data
                .entry(order.payment_method.as_str().to_string())
                .or_default() += 1;
        }
        Ok(Breakdown {
            total: orders.len(),
            data,
        })
    }

    /// Daily creation counts for the trailing `days` window.
    pub async fn orders_by_date(&self, days: u32) -> Result<OrdersByDate> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let orders = self.store.list_all().await?;
        let mut data: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for order in orders.iter().filter(|o| o.created_at > cutoff) {
            *data.entry(order.created_at.date_naive()).or_default() += 1;
        }
        Ok(OrdersByDate {
            data,
            period: format!("{days} days"),
        })
    }
}
