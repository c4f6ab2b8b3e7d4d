//! Order and payment status machines.

use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// Lifecycle status of an order.
///
/// Transitions are monotonic:
/// ```text
/// Created ──┬──► Confirmed ──► Cancelled
///           └────────────────► Cancelled
/// ```
/// `Cancelled` is terminal; nothing leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order persisted, inventory reserved, payment not yet settled.
    #[default]
    Created,

    /// Payment settled; the booking holds its confirmation code.
    Confirmed,

    /// Order cancelled (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if payment confirmation may be attempted.
    pub fn can_confirm(&self) -> bool {
        matches!(self, OrderStatus::Created)
    }

    /// Returns true if the order can be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Created | OrderStatus::Confirmed)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }

    /// Returns the status name as stored on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(OrderStatus::Created),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// Settlement status of an order's payment.
///
/// `Pending → {Paid | Failed}`; `Paid → Refunded` only when a paid
/// order is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting a payment attempt.
    #[default]
    Pending,

    /// Payment settled successfully.
    Paid,

    /// Payment attempt was declined.
    Failed,

    /// A settled payment was refunded on cancellation.
    Refunded,
}

impl PaymentStatus {
    /// Returns the status name as stored on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// Payment methods accepted at order creation.
///
/// Parsed strictly at the boundary; unknown values are rejected rather
/// than silently defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    Ewallet,
}

impl PaymentMethod {
    /// Returns the method name as stored on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::Ewallet => "ewallet",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "ewallet" => Ok(PaymentMethod::Ewallet),
            other => Err(OrderError::UnknownPaymentMethod(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_can_confirm_and_cancel() {
        assert!(OrderStatus::Created.can_confirm());
        assert!(OrderStatus::Created.can_cancel());
        assert!(!OrderStatus::Created.is_terminal());
    }

    #[test]
    fn test_confirmed_can_cancel_but_not_confirm() {
        assert!(!OrderStatus::Confirmed.can_confirm());
        assert!(OrderStatus::Confirmed.can_cancel());
    }

    #[test]
    fn test_cancelled_is_terminal() {
        assert!(!OrderStatus::Cancelled.can_confirm());
        assert!(!OrderStatus::Cancelled.can_cancel());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Confirmed).unwrap(),
            "\"confirmed\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Refunded).unwrap(),
            "\"refunded\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CreditCard).unwrap(),
            "\"credit_card\""
        );
    }

    #[test]
    fn test_payment_method_strict_parse() {
        assert_eq!("cash".parse::<PaymentMethod>(), Ok(PaymentMethod::Cash));
        assert_eq!(
            "credit_card".parse::<PaymentMethod>(),
            Ok(PaymentMethod::CreditCard)
        );
        assert_eq!(
            "ewallet".parse::<PaymentMethod>(),
            Ok(PaymentMethod::Ewallet)
        );
        assert_eq!(
            "bitcoin".parse::<PaymentMethod>(),
            Err(OrderError::UnknownPaymentMethod("bitcoin".to_string()))
        );
    }

    #[test]
    fn test_order_status_parse() {
        assert_eq!("created".parse::<OrderStatus>(), Ok(OrderStatus::Created));
        assert_eq!(
            "cancelled".parse::<OrderStatus>(),
            Ok(OrderStatus::Cancelled)
        );
        assert!("draft".parse::<OrderStatus>().is_err());
    }
}
