//! Health checks and statistics

use super::CacheService;
use crate::backend::BackendInfo;
use crate::breaker::CircuitState;
use crate::metrics::MetricsSnapshot;
use serde::Serialize;
use std::time::Instant;

/// Result of a cache health probe
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub connected: bool,
    pub circuit_state: CircuitState,
    pub latency_ms: Option<f64>,
}

/// Metrics snapshot merged with backend introspection
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
    pub circuit_state: CircuitState,
    pub backend: Option<&'static str>,
    pub connected: bool,
    pub uptime_secs: Option<u64>,
    pub used_memory_bytes: Option<u64>,
    pub key_count: Option<u64>,
}

impl CacheService {
    /// Probe backend reachability with a ping
    ///
    /// An open circuit short-circuits to an unhealthy report without a round
    /// trip; any other circuit state lets the probe through.
    pub async fn health_check(&self) -> HealthReport {
        let circuit_state = self.inner.breaker.state();
        let backend = self.backend().await;
        let connected = backend.as_ref().is_some_and(|b| b.is_ready());

        if circuit_state == CircuitState::Open {
            return HealthReport {
                healthy: false,
                connected,
                circuit_state,
                latency_ms: None,
            };
        }

        let Some(backend) = backend else {
            return HealthReport {
                healthy: false,
                connected: false,
                circuit_state,
                latency_ms: None,
            };
        };

        let started = Instant::now();
        match backend.ping().await {
            Ok(()) => {
                self.inner.breaker.record_success();
                HealthReport {
                    healthy: true,
                    connected: true,
                    circuit_state: self.inner.breaker.state(),
                    latency_ms: Some(started.elapsed().as_secs_f64() * 1_000.0),
                }
            }
            Err(e) => {
                tracing::warn!("cache health check failed: {e}");
                self.inner.breaker.record_failure();
                HealthReport {
                    healthy: false,
                    connected: backend.is_ready(),
                    circuit_state: self.inner.breaker.state(),
                    latency_ms: None,
                }
            }
        }
    }

    /// Snapshot metrics plus backend introspection
    ///
    /// Introspection failures leave the corresponding fields `None`; the call
    /// itself never fails.
    pub async fn stats(&self) -> CacheStats {
        let metrics = self.inner.metrics.snapshot();
        let backend = self.backend().await;

        let (name, info) = match backend {
            Some(b) => (Some(b.backend_name()), b.info().await),
            None => (None, BackendInfo::default()),
        };

        CacheStats {
            metrics,
            circuit_state: self.inner.breaker.state(),
            backend: name,
            connected: info.connected,
            uptime_secs: info.uptime_secs,
            used_memory_bytes: info.used_memory_bytes,
            key_count: info.key_count,
        }
    }
}
