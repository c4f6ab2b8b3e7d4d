//! Circuit breaker guarding calls to one collaborator service.
//!
//! The breaker tracks the outcome of recent calls in a sliding window.
//! When the failure rate over the window crosses a threshold it opens
//! and short-circuits further calls without touching the network. After
//! a cool-down a single trial call is admitted; its outcome decides
//! whether the breaker closes again or reopens.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::ClientError;

/// Breaker tuning, shared by all three collaborator clients.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Number of recent call outcomes kept in the sliding window.
    pub window_size: usize,
    /// Failure rate over the window that opens the breaker.
    pub failure_rate_threshold: f64,
    /// Minimum outcomes in the window before the rate is evaluated.
    pub min_calls: usize,
    /// Time spent open before a trial call is admitted.
    pub cool_down: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            failure_rate_threshold: 0.5,
            min_calls: 5,
            cool_down: Duration::from_secs(30),
        }
    }
}

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls pass through; outcomes feed the sliding window.
    Closed,
    /// Calls short-circuit to [`ClientError::CircuitOpen`].
    Open,
    /// One trial call is in flight or about to be admitted.
    HalfOpen,
}

#[derive(Debug)]
enum Phase {
    Closed,
    Open { since: Instant },
    HalfOpen { trial_in_flight: bool },
}

#[derive(Debug)]
struct BreakerInner {
    phase: Phase,
    window: VecDeque<bool>,
}

/// Sliding-window circuit breaker for one collaborator.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    service: &'static str,
    config: BreakerConfig,
    inner: Arc<Mutex<BreakerInner>>,
}

enum Admission {
    Allowed,
    Rejected,
}

impl CircuitBreaker {
    /// Creates a closed breaker labelled with the collaborator it guards.
    pub fn new(service: &'static str, config: BreakerConfig) -> Self {
        Self {
            service,
            config,
            inner: Arc::new(Mutex::new(BreakerInner {
                phase: Phase::Closed,
                window: VecDeque::new(),
            })),
        }
    }

    /// The collaborator this breaker guards.
    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Current state, for tests and diagnostics.
    pub fn state(&self) -> BreakerState {
        let inner = self.inner.lock().unwrap();
        match inner.phase {
            Phase::Closed => BreakerState::Closed,
            Phase::Open { .. } => BreakerState::Open,
            Phase::HalfOpen { .. } => BreakerState::HalfOpen,
        }
    }

    /// Runs `operation` through the breaker.
    ///
    /// Returns [`ClientError::CircuitOpen`] without invoking the
    /// operation when the breaker is open.
    pub async fn call<F, Fut, T>(&self, operation: F) -> Result<T, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        if matches!(self.admit(), Admission::Rejected) {
            tracing::warn!(service = self.service, "circuit open, rejecting call");
            return Err(ClientError::CircuitOpen {
                service: self.service,
            });
        }

        match operation().await {
            Ok(value) => {
                self.record(true);
                Ok(value)
            }
            Err(err) => {
                self.record(false);
                Err(err)
            }
        }
    }

    fn admit(&self) -> Admission {
        let mut inner = self.inner.lock().unwrap();
        match inner.phase {
            Phase::Closed => Admission::Allowed,
            Phase::Open { since } => {
                if since.elapsed() >= self.config.cool_down {
                    tracing::info!(service = self.service, "cool-down over, admitting trial call");
                    inner.phase = Phase::HalfOpen {
                        trial_in_flight: true,
                    };
                    Admission::Allowed
                } else {
                    Admission::Rejected
                }
            }
            Phase::HalfOpen { trial_in_flight } => {
                if trial_in_flight {
                    Admission::Rejected
                } else {
                    inner.phase = Phase::HalfOpen {
                        trial_in_flight: true,
                    };
                    Admission::Allowed
                }
            }
        }
    }

    fn record(&self, success: bool) {
        let mut inner = self.inner.lock().unwrap();
        match inner.phase {
            Phase::Closed => {
                inner.window.push_back(success);
                while inner.window.len() > self.config.window_size {
                    inner.window.pop_front();
                }
                if inner.window.len() >= self.config.min_calls {
                    let failures = inner.window.iter().filter(|ok| !**ok).count();
                    let rate = failures as f64 / inner.window.len() as f64;
                    if rate >= self.config.failure_rate_threshold {
                        tracing::warn!(
                            service = self.service,
                            failure_rate = rate,
                            "failure rate over threshold, opening circuit"
                        );
                        inner.phase = Phase::Open {
                            since: Instant::now(),
                        };
                        inner.window.clear();
                    }
                }
            }
            Phase::HalfOpen { .. } => {
                if success {
                    tracing::info!(service = self.service, "trial call succeeded, closing circuit");
                    inner.phase = Phase::Closed;
                    inner.window.clear();
                } else {
                    tracing::warn!(service = self.service, "trial call failed, reopening circuit");
                    inner.phase = Phase::Open {
                        since: Instant::now(),
                    };
                }
            }
            // A call admitted before the breaker opened may report late.
            Phase::Open { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> BreakerConfig {
        BreakerConfig {
            window_size: 4,
            failure_rate_threshold: 0.5,
            min_calls: 4,
            cool_down: Duration::from_millis(50),
        }
    }

    fn failing() -> Result<u32, ClientError> {
        Err(ClientError::Transport {
            service: "inventory",
            message: "connection refused".to_string(),
        })
    }

    #[tokio::test]
    async fn test_stays_closed_on_success() {
        let breaker = CircuitBreaker::new("inventory", fast_config());
        for _ in 0..10 {
            breaker.call(|| async { Ok::<_, ClientError>(1) }).await.unwrap();
        }
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_opens_when_failure_rate_crosses_threshold() {
        let breaker = CircuitBreaker::new("inventory", fast_config());

        // Two successes and two failures: rate exactly at threshold.
        for _ in 0..2 {
            let _ = breaker.call(|| async { Ok::<_, ClientError>(1) }).await;
        }
        for _ in 0..2 {
            let _ = breaker.call(|| async { failing() }).await;
        }

        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[tokio::test]
    async fn test_does_not_trip_below_min_calls() {
        let breaker = CircuitBreaker::new("inventory", fast_config());
        for _ in 0..3 {
            let _ = breaker.call(|| async { failing() }).await;
        }
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_open_breaker_short_circuits() {
        let breaker = CircuitBreaker::new("inventory", fast_config());
        for _ in 0..4 {
            let _ = breaker.call(|| async { failing() }).await;
        }

        let err = breaker
            .call(|| async { Ok::<_, ClientError>(1) })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::CircuitOpen { service: "inventory" }));
    }

    #[tokio::test]
    async fn test_trial_success_closes_circuit() {
        let breaker = CircuitBreaker::new("inventory", fast_config());
        for _ in 0..4 {
            let _ = breaker.call(|| async { failing() }).await;
        }
        tokio::time::sleep(Duration::from_millis(80)).await;

        breaker
            .call(|| async { Ok::<_, ClientError>(1) })
            .await
            .unwrap();
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_trial_failure_reopens_circuit() {
        let breaker = CircuitBreaker::new("inventory", fast_config());
        for _ in 0..4 {
            let _ = breaker.call(|| async { failing() }).await;
        }
        tokio::time::sleep(Duration::from_millis(80)).await;

        let _ = breaker.call(|| async { failing() }).await;
        assert_eq!(breaker.state(), BreakerState::Open);

        // Immediately after reopening, calls are rejected again.
        let err = breaker
            .call(|| async { Ok::<_, ClientError>(1) })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::CircuitOpen { .. }));
    }

    #[tokio::test]
    async fn test_half_open_admits_a_single_trial() {
        let breaker = CircuitBreaker::new("inventory", fast_config());
        for _ in 0..4 {
            let _ = breaker.call(|| async { failing() }).await;
        }
        tokio::time::sleep(Duration::from_millis(80)).await;

        // First admission flips to half-open; a second concurrent
        // admission must be rejected while the trial is in flight.
        assert!(matches!(breaker.admit(), Admission::Allowed));
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        assert!(matches!(breaker.admit(), Admission::Rejected));

        breaker.record(true);
        assert_eq!(breaker.state(), BreakerState::Closed);
    }
}
