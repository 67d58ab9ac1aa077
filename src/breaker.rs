//! Circuit breaker for the cache backend
//!
//! Three-state failure-tracking machine gating whether the backend is worth
//! attempting. Closed failures accumulate inside a monitoring window; once the
//! threshold trips, the circuit opens and every operation short-circuits until
//! the reset timeout elapses. Recovery is probed lazily: the next availability
//! check after the timeout moves to half-open. The transition back to closed
//! is asymmetric on purpose: a single half-open failure reopens the circuit,
//! while three consecutive successes are required to close it, so a flapping
//! backend cannot repeatedly drag the application into degraded mode.

use serde::Serialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Windowed failures required to open the circuit
    pub failure_threshold: u32,
    /// Cooldown before an open circuit permits a probe
    pub reset_timeout: Duration,
    /// Failures further apart than this do not accumulate
    pub monitoring_window: Duration,
    /// Consecutive half-open successes required to close
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            failure_threshold: CIRCUIT_BREAKER_FAILURE_THRESHOLD,
            reset_timeout: Duration::from_millis(CIRCUIT_BREAKER_RESET_TIMEOUT_MS),
            monitoring_window: Duration::from_millis(CIRCUIT_BREAKER_MONITORING_WINDOW_MS),
            success_threshold: CIRCUIT_BREAKER_SUCCESS_THRESHOLD,
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure: Option<Instant>,
}

/// In-memory circuit breaker
///
/// State is confined to the owning cache service instance; it is never
/// persisted and resets to closed on process restart.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker in the closed state
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                last_failure: None,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Check whether an operation may be attempted
    ///
    /// An open circuit whose reset timeout has elapsed transitions to
    /// half-open here, on the call path rather than via a timer.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled_down = inner
                    .last_failure
                    .is_none_or(|at| at.elapsed() >= self.config.reset_timeout);
                if cooled_down {
                    inner.state = CircuitState::HalfOpen;
                    inner.success_count = 0;
                    tracing::info!("circuit breaker half-open, probing backend");
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful backend operation
    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.success_count += 1;
            if inner.success_count >= self.config.success_threshold {
                inner.state = CircuitState::Closed;
                inner.failure_count = 0;
                inner.success_count = 0;
                inner.last_failure = None;
                tracing::info!("circuit breaker closed, backend recovered");
            }
        }
    }

    /// Record a failed backend operation
    pub fn record_failure(&self) {
        let now = Instant::now();
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                // Failures outside the monitoring window don't accumulate
                if let Some(last) = inner.last_failure
                    && now.duration_since(last) > self.config.monitoring_window
                {
                    inner.failure_count = 0;
                }
                inner.failure_count += 1;
                inner.last_failure = Some(now);
                if inner.failure_count >= self.config.failure_threshold {
                    inner.state = CircuitState::Open;
                    tracing::warn!(
                        failures = inner.failure_count,
                        "circuit breaker open, backend short-circuited"
                    );
                }
            }
            CircuitState::HalfOpen => {
                // One probe failure immediately reopens
                inner.state = CircuitState::Open;
                inner.last_failure = Some(now);
                tracing::warn!("circuit breaker reopened, probe failed");
            }
            CircuitState::Open => {
                // Already open, nothing to do
            }
        }
    }

    /// Current state
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    #[cfg(test)]
    fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }
}
