//! The Order aggregate root.

use chrono::{DateTime, Utc};
use common::{OrderId, ScheduleId, TicketTypeId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderError;
use crate::order::snapshot::ScheduleSnapshot;
use crate::order::status::{OrderStatus, PaymentMethod, PaymentStatus};
use crate::order::value_objects::{Money, PassengerDetails};

/// An order that has not been persisted yet.
///
/// The store assigns the id and creation timestamp on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_ref: UserId,
    pub user_email_snapshot: Option<String>,
    pub schedule_ref: ScheduleId,
    pub schedule_snapshot: ScheduleSnapshot,
    pub ticket_type_ref: TicketTypeId,
    pub ticket_type_name_snapshot: Option<String>,
    pub quantity: u32,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub passenger_details: PassengerDetails,
}

impl NewOrder {
    /// Validates the quantity invariant; everything else is validated
    /// upstream by the orchestrator.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.quantity == 0 {
            return Err(OrderError::InvalidQuantity(self.quantity));
        }
        Ok(())
    }
}

/// The persisted order aggregate.
///
/// Status fields are only mutated through [`Order::confirm`],
/// [`Order::fail_payment`], and [`Order::cancel`], which enforce the
/// monotonic transition rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_ref: UserId,
    pub user_email_snapshot: Option<String>,
    pub schedule_ref: ScheduleId,
    pub schedule_snapshot: ScheduleSnapshot,
    pub ticket_type_ref: TicketTypeId,
    pub ticket_type_name_snapshot: Option<String>,
    pub quantity: u32,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub passenger_details: PassengerDetails,
    pub confirmation_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Materializes a freshly inserted order in `created`/`pending`.
    pub fn from_new(new: NewOrder, id: OrderId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_ref: new.user_ref,
            user_email_snapshot: new.user_email_snapshot,
            schedule_ref: new.schedule_ref,
            schedule_snapshot: new.schedule_snapshot,
            ticket_type_ref: new.ticket_type_ref,
            ticket_type_name_snapshot: new.ticket_type_name_snapshot,
            quantity: new.quantity,
            total_amount: new.total_amount,
            payment_method: new.payment_method,
            payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::Created,
            passenger_details: new.passenger_details,
            confirmation_code: None,
            created_at,
            confirmed_at: None,
        }
    }

    /// Marks the payment settled: `created/pending → confirmed/paid`,
    /// assigns the confirmation code and confirmation timestamp.
    ///
    /// A failed payment is terminal for the order: its reservation was
    /// already released, so `failed → paid` is not a legal transition.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.order_status.can_confirm() {
            return Err(OrderError::InvalidStatusTransition {
                operation: "confirm payment for",
                current: self.order_status,
            });
        }
        if self.payment_status != PaymentStatus::Pending {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.payment_status,
                to: PaymentStatus::Paid,
            });
        }
        self.payment_status = PaymentStatus::Paid;
        self.order_status = OrderStatus::Confirmed;
        self.confirmation_code = Some(generate_confirmation_code());
        self.confirmed_at = Some(now);
        Ok(())
    }

    /// Records a declined payment attempt: `pending → failed`. The
    /// order itself stays `created`.
    pub fn fail_payment(&mut self) -> Result<(), OrderError> {
        if !self.order_status.can_confirm() {
            return Err(OrderError::InvalidStatusTransition {
                operation: "fail payment for",
                current: self.order_status,
            });
        }
        if self.payment_status != PaymentStatus::Pending
            && self.payment_status != PaymentStatus::Failed
        {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.payment_status,
                to: PaymentStatus::Failed,
            });
        }
        self.payment_status = PaymentStatus::Failed;
        Ok(())
    }

    /// Cancels the order; a paid order is marked refunded.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !self.order_status.can_cancel() {
            return Err(OrderError::InvalidStatusTransition {
                operation: "cancel",
                current: self.order_status,
            });
        }
        self.order_status = OrderStatus::Cancelled;
        if self.payment_status == PaymentStatus::Paid {
            self.payment_status = PaymentStatus::Refunded;
        }
        Ok(())
    }

    /// Returns true if the given user owns this order.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user_ref == user
    }
}

/// Generates a booking confirmation code: a fixed `BK-` prefix plus 8
/// uppercase alphanumeric characters.
fn generate_confirmation_code() -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("BK-{}", token[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_snapshot() -> ScheduleSnapshot {
        let dep = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let arr = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        ScheduleSnapshot::new("SE1", "Ha Noi", "Da Nang", dep, arr, 270)
    }

    fn sample_order() -> Order {
        let new = NewOrder {
            user_ref: UserId::new(1),
            user_email_snapshot: Some("an@example.com".to_string()),
            schedule_ref: ScheduleId::new(10),
            schedule_snapshot: sample_snapshot(),
            ticket_type_ref: TicketTypeId::new(5),
            ticket_type_name_snapshot: Some("Soft seat".to_string()),
            quantity: 3,
            total_amount: Money::from_cents(36000),
            payment_method: PaymentMethod::CreditCard,
            passenger_details: PassengerDetails::from_value(json!([{}, {}, {}]), 3).unwrap(),
        };
        Order::from_new(new, OrderId::new(1), Utc::now())
    }

    #[test]
    fn test_new_order_rejects_zero_quantity() {
        let new = NewOrder {
            user_ref: UserId::new(1),
            user_email_snapshot: None,
            schedule_ref: ScheduleId::new(10),
            schedule_snapshot: sample_snapshot(),
            ticket_type_ref: TicketTypeId::new(5),
            ticket_type_name_snapshot: None,
            quantity: 0,
            total_amount: Money::zero(),
            payment_method: PaymentMethod::Cash,
            passenger_details: PassengerDetails::default(),
        };
        assert_eq!(new.validate(), Err(OrderError::InvalidQuantity(0)));
    }

    #[test]
    fn test_fresh_order_is_created_pending() {
        let order = sample_order();
        assert_eq!(order.order_status, OrderStatus::Created);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert!(order.confirmation_code.is_none());
        assert!(order.confirmed_at.is_none());
    }

    #[test]
    fn test_confirm_sets_code_and_timestamp() {
        let mut order = sample_order();
        order.confirm(Utc::now()).unwrap();

        assert_eq!(order.order_status, OrderStatus::Confirmed);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        let code = order.confirmation_code.as_deref().unwrap();
        assert!(code.starts_with("BK-"));
        assert_eq!(code.len(), 11);
        assert!(
            code[3..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
        assert!(order.confirmed_at.is_some());
    }

    #[test]
    fn test_confirm_twice_is_rejected() {
        let mut order = sample_order();
        order.confirm(Utc::now()).unwrap();
        let first_code = order.confirmation_code.clone();

        let err = order.confirm(Utc::now()).unwrap_err();
        assert!(matches!(err, OrderError::InvalidStatusTransition { .. }));
        // No second code was generated.
        assert_eq!(order.confirmation_code, first_code);
    }

    #[test]
    fn test_fail_payment_keeps_order_created() {
        let mut order = sample_order();
        order.fail_payment().unwrap();

        assert_eq!(order.order_status, OrderStatus::Created);
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert!(order.confirmation_code.is_none());
    }

    #[test]
    fn test_confirm_after_failed_payment_is_rejected() {
        let mut order = sample_order();
        order.fail_payment().unwrap();

        let err = order.confirm(Utc::now()).unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidPaymentTransition {
                from: PaymentStatus::Failed,
                to: PaymentStatus::Paid,
            }
        );
        // Nothing moved.
        assert_eq!(order.order_status, OrderStatus::Created);
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert!(order.confirmation_code.is_none());
    }

    #[test]
    fn test_cancel_pending_order() {
        let mut order = sample_order();
        order.cancel().unwrap();

        assert_eq!(order.order_status, OrderStatus::Cancelled);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_cancel_paid_order_refunds() {
        let mut order = sample_order();
        order.confirm(Utc::now()).unwrap();
        order.cancel().unwrap();

        assert_eq!(order.order_status, OrderStatus::Cancelled);
        assert_eq!(order.payment_status, PaymentStatus::Refunded);
    }

    #[test]
    fn test_cancel_is_terminal() {
        let mut order = sample_order();
        order.cancel().unwrap();

        assert!(matches!(
            order.cancel(),
            Err(OrderError::InvalidStatusTransition { .. })
        ));
        assert!(matches!(
            order.confirm(Utc::now()),
            Err(OrderError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_ownership_check() {
        let order = sample_order();
        assert!(order.is_owned_by(UserId::new(1)));
        assert!(!order.is_owned_by(UserId::new(2)));
    }

    #[test]
    fn test_confirmation_codes_are_unique() {
        let mut codes = std::collections::HashSet::new();
        for _ in 0..100 {
            let mut order = sample_order();
            order.confirm(Utc::now()).unwrap();
            codes.insert(order.confirmation_code.unwrap());
        }
        assert_eq!(codes.len(), 100);
    }
}
