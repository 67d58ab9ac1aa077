//! Cache service
//!
//! The process-wide owner of the backend handle, circuit breaker, metrics,
//! and validated configuration. Every public method is total: a cache failure
//! is converted into a miss, a `false`, or a zero count before it can reach a
//! caller. From the outside, "cache disabled", "cache down", and "cache miss"
//! are indistinguishable; logs and metrics keep the causes separate.

mod operations;
mod read_through;
mod stats;

pub use stats::{CacheStats, HealthReport};

use crate::backend::{CacheBackend, MemoryBackend, RedisBackend};
use crate::breaker::CircuitBreaker;
use crate::config::{BackendKind, CacheConfig};
use crate::constants::{
    CONNECT_BASE_DELAY, CONNECT_MAX_ATTEMPTS, CONNECT_MAX_DELAY, RECONNECT_PROBE_INTERVAL,
};
use crate::error::{Error, Result};
use crate::metrics::CacheMetrics;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;
use tokio::sync::RwLock;

pub(crate) struct ServiceInner {
    pub(crate) config: CacheConfig,
    pub(crate) backend: RwLock<Option<Arc<dyn CacheBackend>>>,
    pub(crate) breaker: CircuitBreaker,
    pub(crate) metrics: CacheMetrics,
    /// Timestamp of the last background readiness probe
    last_probe: Mutex<Option<Instant>>,
}

/// Resilient read-through cache service
///
/// Cheap to clone; all clones share one backend connection, breaker, and
/// metrics state.
#[derive(Clone)]
pub struct CacheService {
    pub(crate) inner: Arc<ServiceInner>,
}

impl CacheService {
    /// Create a service from a validated configuration
    ///
    /// Validation is eager: invalid values fail here, before any traffic.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(ServiceInner {
                breaker: CircuitBreaker::new((&config.breaker).into()),
                metrics: CacheMetrics::new(config.metrics_enabled),
                backend: RwLock::new(None),
                last_probe: Mutex::new(None),
                config,
            }),
        })
    }

    /// Create a service with an already-connected backend (dependency injection)
    pub fn with_backend(config: CacheConfig, backend: Arc<dyn CacheBackend>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(ServiceInner {
                breaker: CircuitBreaker::new((&config.breaker).into()),
                metrics: CacheMetrics::new(config.metrics_enabled),
                backend: RwLock::new(Some(backend)),
                last_probe: Mutex::new(None),
                config,
            }),
        })
    }

    /// Establish the backend connection
    ///
    /// Idempotent: a no-op when caching is disabled or already connected.
    /// Connection failure is swallowed after bounded retries so the host
    /// application can run cache-less.
    pub async fn connect(&self) {
        if !self.inner.config.enabled {
            tracing::info!("caching disabled, skipping backend connection");
            return;
        }
        if self.inner.backend.read().await.is_some() {
            return;
        }

        match self.inner.config.backend {
            BackendKind::Memory => {
                *self.inner.backend.write().await = Some(Arc::new(MemoryBackend::new()));
                tracing::info!("memory cache backend initialized");
            }
            BackendKind::Redis => {
                let mut delay = CONNECT_BASE_DELAY;
                for attempt in 1..=CONNECT_MAX_ATTEMPTS {
                    match RedisBackend::connect(&self.inner.config.redis).await {
                        Ok(backend) => {
                            *self.inner.backend.write().await = Some(Arc::new(backend));
                            tracing::info!(
                                host = %self.inner.config.redis.host,
                                port = self.inner.config.redis.port,
                                "redis cache connection established"
                            );
                            return;
                        }
                        Err(e) => {
                            tracing::warn!(attempt, "redis connection failed: {e}");
                            if attempt < CONNECT_MAX_ATTEMPTS {
                                tokio::time::sleep(delay).await;
                                delay = (delay * 2).min(CONNECT_MAX_DELAY);
                            }
                        }
                    }
                }
                tracing::warn!(
                    attempts = CONNECT_MAX_ATTEMPTS,
                    "cache backend unreachable, running cache-less"
                );
            }
        }
    }

    /// Whether the master switch is on
    pub fn is_enabled(&self) -> bool {
        self.inner.config.enabled
    }

    /// Get configuration
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub(crate) async fn backend(&self) -> Option<Arc<dyn CacheBackend>> {
        self.inner.backend.read().await.clone()
    }

    /// Availability gate applied before every operation
    ///
    /// Requires the master switch, a connected and ready backend, and a
    /// permitting circuit breaker. All three causes collapse into `None`.
    pub(crate) async fn available_backend(&self) -> Option<Arc<dyn CacheBackend>> {
        if !self.inner.config.enabled {
            return None;
        }
        let backend = self.backend().await?;
        if !backend.is_ready() {
            tracing::debug!("cache backend not ready, treating as unavailable");
            self.spawn_readiness_probe(&backend);
            return None;
        }
        if !self.inner.breaker.allow_request() {
            tracing::debug!("circuit breaker open, treating cache as unavailable");
            return None;
        }
        Some(backend)
    }

    /// Fire a throttled background ping so a recovered connection flips back
    /// to ready without blocking the caller
    fn spawn_readiness_probe(&self, backend: &Arc<dyn CacheBackend>) {
        let mut last_probe = match self.inner.last_probe.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let due = last_probe.is_none_or(|at| at.elapsed() >= RECONNECT_PROBE_INTERVAL);
        if !due {
            return;
        }
        *last_probe = Some(Instant::now());
        drop(last_probe);

        let backend = Arc::clone(backend);
        tokio::spawn(async move {
            if let Err(e) = backend.ping().await {
                tracing::debug!("readiness probe failed: {e}");
            }
        });
    }
}

/// Global cache service instance
static CACHE_SERVICE: OnceLock<CacheService> = OnceLock::new();

/// Initialize the global cache service
pub fn init_cache_service(config: CacheConfig) -> Result<()> {
    let service = CacheService::new(config)?;
    CACHE_SERVICE
        .set(service)
        .map_err(|_| Error::cache("cache service already initialized"))
}

/// Get the global cache service
pub fn cache_service() -> Option<&'static CacheService> {
    CACHE_SERVICE.get()
}
