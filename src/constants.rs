//! Application-wide constants
//!
//! Central location for tunable defaults. Runtime overrides come from
//! [`crate::config::CacheConfig`]; the values here are the fallbacks.

use std::time::Duration;

/// Key-space namespace prefixed to every cache key
pub const APP_NAMESPACE: &str = "jobnimbus";

/// Environment variable prefix for configuration overrides
pub const CONFIG_ENV_PREFIX: &str = "JNCACHE";

/// Default configuration file name searched in the working directory
pub const DEFAULT_CONFIG_FILENAME: &str = "jn-cache.toml";

/// TTL applied when an operation has no entry in the TTL table
pub const DEFAULT_TTL_SECS: u64 = 900;

/// Serialized payloads above this size are gzip-compressed before storage
pub const COMPRESSION_THRESHOLD_BYTES: usize = 1024;

/// Marker prefixed to compressed entries on the wire
pub const COMPRESSION_PREFIX: &str = "gzip:";

/// Default ceiling for a single serialized cache entry
pub const DEFAULT_MAX_ITEM_SIZE_KB: u64 = 512;

/// Hard upper bound for the configurable item-size ceiling
pub const MAX_ITEM_SIZE_CEILING_KB: u64 = 10_240;

/// Consecutive failures within the monitoring window that trip the circuit
pub const CIRCUIT_BREAKER_FAILURE_THRESHOLD: u32 = 5;

/// Cooldown before an open circuit probes the backend again
pub const CIRCUIT_BREAKER_RESET_TIMEOUT_MS: u64 = 30_000;

/// Failures older than this window do not accumulate toward the threshold
pub const CIRCUIT_BREAKER_MONITORING_WINDOW_MS: u64 = 60_000;

/// Consecutive half-open successes required to close the circuit
pub const CIRCUIT_BREAKER_SUCCESS_THRESHOLD: u32 = 3;

/// COUNT hint for cursor-based SCAN during pattern invalidation
pub const SCAN_BATCH_SIZE: usize = 100;

/// Number of latency samples kept in the rolling metrics window
pub const LATENCY_WINDOW_SIZE: usize = 100;

/// Connection attempts made by `connect()` before running cache-less
pub const CONNECT_MAX_ATTEMPTS: u32 = 5;

/// Initial delay between connection attempts (doubled per attempt)
pub const CONNECT_BASE_DELAY: Duration = Duration::from_millis(250);

/// Cap on the delay between connection attempts
pub const CONNECT_MAX_DELAY: Duration = Duration::from_millis(5_000);

/// Default Redis connect timeout
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Default number of driver-level retries per request
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Minimum spacing between background readiness probes of a not-ready backend
pub const RECONNECT_PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on entries held by the in-process memory backend
pub const MEMORY_BACKEND_MAX_ENTRIES: u64 = 10_000;
