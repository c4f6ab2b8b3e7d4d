//! Error type shared by all collaborator clients.

use thiserror::Error;

/// Failure talking to a collaborator service.
///
/// Every transport-level error is normalized into one of these variants
/// at the client boundary; reqwest types never cross it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service's circuit breaker is open; no network call was made.
    #[error("{service} service unavailable: circuit breaker is open")]
    CircuitOpen { service: &'static str },

    /// The request did not complete within the configured timeout.
    #[error("{service} service timed out")]
    Timeout { service: &'static str },

    /// A connection-level failure (refused, DNS, reset).
    #[error("{service} service unreachable: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    /// The service answered with a non-success HTTP status.
    #[error("{service} service returned status {status}")]
    Status { service: &'static str, status: u16 },

    /// The service answered 2xx but the body did not match the contract.
    #[error("{service} service returned an unexpected payload: {message}")]
    UnexpectedPayload {
        service: &'static str,
        message: String,
    },
}

impl ClientError {
    /// The collaborator this failure came from.
    pub fn service(&self) -> &'static str {
        match self {
            Self::CircuitOpen { service }
            | Self::Timeout { service }
            | Self::Transport { service, .. }
            | Self::Status { service, .. }
            | Self::UnexpectedPayload { service, .. } => service,
        }
    }

    pub(crate) fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout { service };
        }
        if err.is_decode() {
            return Self::UnexpectedPayload {
                service,
                message: err.to_string(),
            };
        }
        Self::Transport {
            service,
            message: err.to_string(),
        }
    }
}
