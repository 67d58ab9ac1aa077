//! Resilient read-through cache layer for the JobNimbus MCP server
//!
//! Sits between MCP tool handlers and the upstream CRM API. A cache here is
//! an optimization, never a dependency: every public method of the service is
//! total, and the only errors that ever reach a tool handler are the ones its
//! own fetch function produced.
//!
//! # Architecture
//!
//! - [`keys`] - pure key construction, parsing, and the tiered TTL table
//! - [`codec`] - JSON with transparent gzip compression (`gzip:` wire prefix)
//! - [`breaker`] - three-state circuit breaker gating backend round trips
//! - [`backend`] - the storage seam: Redis (shared) or moka (in-process)
//! - [`service`] - the cache service and its `with_cache` read-through helper
//! - [`config`] - Figment-layered configuration with eager validation
//!
//! # Example
//!
//! ```ignore
//! use jobnimbus_mcp_cache::{CacheService, ConfigLoader};
//!
//! let config = ConfigLoader::new().load()?;
//! let cache = CacheService::new(config)?;
//! cache.connect().await;
//!
//! let jobs = cache
//!     .with_cache("jobs", "list", "page:1", Some(600), || api.list_jobs(1))
//!     .await?;
//! ```

pub mod backend;
pub mod breaker;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod keys;
pub mod logging;
pub mod metrics;
pub mod service;

pub use breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use config::{BackendKind, BreakerConfig, CacheConfig, ConfigLoader, RedisConfig};
pub use error::{Error, Result};
pub use keys::{build_invalidation_pattern, build_key, parse_key, ttl_for};
pub use metrics::MetricsSnapshot;
pub use service::{CacheService, CacheStats, HealthReport, cache_service, init_cache_service};
