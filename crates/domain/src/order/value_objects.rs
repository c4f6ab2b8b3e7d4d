//! Value objects for the order domain.

use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// Money amount in cents, avoiding floating point for currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Creates a money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Multiplies the amount by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents * i64::from(quantity),
        }
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.cents / 100;
        let frac = (self.cents % 100).abs();
        if self.cents < 0 && whole == 0 {
            write!(f, "-{whole}.{frac:02}")
        } else {
            write!(f, "{whole}.{frac:02}")
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

/// Opaque passenger payload attached to an order.
///
/// The records themselves are owned by the caller; the orchestrator
/// only requires a well-formed array and logs (but does not reject)
/// a count that disagrees with the ordered quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PassengerDetails(Vec<serde_json::Value>);

impl PassengerDetails {
    /// Validates a raw JSON payload as a passenger list.
    ///
    /// Fails if the payload is anything other than a JSON array. A
    /// record count that differs from `quantity` is logged at `warn`
    /// and accepted, matching the documented permissive behavior.
    pub fn from_value(payload: serde_json::Value, quantity: u32) -> Result<Self, OrderError> {
        let records = match payload {
            serde_json::Value::Array(records) => records,
            _ => return Err(OrderError::MalformedPassengerDetails),
        };

        if records.len() != quantity as usize {
            tracing::warn!(
                passengers = records.len(),
                quantity,
                "passenger count does not match ordered quantity"
            );
        }

        Ok(Self(records))
    }

    /// Returns the number of passenger records.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no passenger records.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the records as a slice.
    pub fn records(&self) -> &[serde_json::Value] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(36000);
        assert_eq!(money.cents(), 36000);
        assert_eq!(money.to_string(), "360.00");
    }

    #[test]
    fn test_money_multiply() {
        assert_eq!(Money::from_cents(12000).multiply(3).cents(), 36000);
        assert_eq!(Money::zero().multiply(10), Money::zero());
    }

    #[test]
    fn test_money_display_negative() {
        assert_eq!(Money::from_cents(-50).to_string(), "-0.50");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
    }

    #[test]
    fn test_money_add() {
        let mut total = Money::from_cents(100);
        total += Money::from_cents(50);
        assert_eq!(total, Money::from_cents(150));
        assert_eq!(total + Money::from_cents(50), Money::from_cents(200));
    }

    #[test]
    fn test_passenger_details_accepts_array() {
        let payload = json!([{"name": "An"}, {"name": "Binh"}]);
        let details = PassengerDetails::from_value(payload, 2).unwrap();
        assert_eq!(details.len(), 2);
    }

    #[test]
    fn test_passenger_details_rejects_non_array() {
        let payload = json!({"name": "An"});
        assert_eq!(
            PassengerDetails::from_value(payload, 1),
            Err(OrderError::MalformedPassengerDetails)
        );
    }

    #[test]
    fn test_passenger_count_mismatch_is_accepted() {
        // Mismatch is logged, not rejected.
        let payload = json!([{"name": "An"}]);
        let details = PassengerDetails::from_value(payload, 3).unwrap();
        assert_eq!(details.len(), 1);
    }

    #[test]
    fn test_passenger_details_serialization() {
        let details = PassengerDetails::from_value(json!([{"name": "An"}]), 1).unwrap();
        let json = serde_json::to_value(&details).unwrap();
        assert!(json.is_array());
    }
}
