//! Collaborator client configuration loaded from environment variables.

use std::time::Duration;

use crate::breaker::BreakerConfig;

/// Immutable configuration for the three collaborator clients.
///
/// Built once at startup and handed to the HTTP clients; never mutated
/// afterwards. Reads from environment variables:
/// - `INVENTORY_SERVICE_URL` (default: `http://localhost:8081`)
/// - `PAYMENT_SERVICE_URL` (default: `http://localhost:8082`)
/// - `SCHEDULE_SERVICE_URL` (default: `http://localhost:8083`)
#[derive(Debug, Clone)]
pub struct ClientsConfig {
    pub inventory_url: String,
    pub payment_url: String,
    pub schedule_url: String,
    /// Request timeout for inventory calls.
    pub inventory_timeout: Duration,
    /// Request timeout for schedule calls.
    pub schedule_timeout: Duration,
    /// Request timeout for payment calls. Longer than the others since
    /// the payment service talks to an external gateway.
    pub payment_timeout: Duration,
    pub breaker: BreakerConfig,
}

impl ClientsConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            inventory_url: std::env::var("INVENTORY_SERVICE_URL")
                .unwrap_or(defaults.inventory_url),
            payment_url: std::env::var("PAYMENT_SERVICE_URL").unwrap_or(defaults.payment_url),
            schedule_url: std::env::var("SCHEDULE_SERVICE_URL").unwrap_or(defaults.schedule_url),
            ..defaults
        }
    }
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            inventory_url: "http://localhost:8081".to_string(),
            payment_url: "http://localhost:8082".to_string(),
            schedule_url: "http://localhost:8083".to_string(),
            inventory_timeout: Duration::from_secs(5),
            schedule_timeout: Duration::from_secs(5),
            payment_timeout: Duration::from_secs(10),
            breaker: BreakerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let config = ClientsConfig::default();
        assert_eq!(config.inventory_timeout, Duration::from_secs(5));
        assert_eq!(config.schedule_timeout, Duration::from_secs(5));
        assert_eq!(config.payment_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_default_urls() {
        let config = ClientsConfig::default();
        assert_eq!(config.inventory_url, "http://localhost:8081");
        assert_eq!(config.payment_url, "http://localhost:8082");
        assert_eq!(config.schedule_url, "http://localhost:8083");
    }
}
