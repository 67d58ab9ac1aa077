//! Configuration management
//!
//! Layered loading via Figment: defaults, then an optional TOML file, then
//! `JNCACHE_*` environment variables (nested keys use a double underscore,
//! e.g. `JNCACHE_REDIS__HOST`). Validation runs eagerly and aggregates every
//! violation into a single error so operators see the full list at once.

use crate::breaker::CircuitBreakerConfig;
use crate::constants::*;
use crate::error::{Error, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which backing store the service connects to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Shared Redis instance (multi-process deployments)
    Redis,
    /// In-process moka cache (single-instance deployments, tests)
    Memory,
}

/// Redis connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
    /// Only applied when explicitly enabled
    pub tls: bool,
    /// Set to false to skip certificate verification (TLS only)
    pub verify_certificates: bool,
    /// Driver-level retries per request
    pub max_retries: u32,
    pub connect_timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            db: 0,
            tls: false,
            verify_certificates: true,
            max_retries: DEFAULT_MAX_RETRIES,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

/// Circuit breaker thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub reset_timeout_ms: u64,
    pub monitoring_window_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: CIRCUIT_BREAKER_FAILURE_THRESHOLD,
            reset_timeout_ms: CIRCUIT_BREAKER_RESET_TIMEOUT_MS,
            monitoring_window_ms: CIRCUIT_BREAKER_MONITORING_WINDOW_MS,
        }
    }
}

impl From<&BreakerConfig> for CircuitBreakerConfig {
    fn from(config: &BreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold,
            reset_timeout: Duration::from_millis(config.reset_timeout_ms),
            monitoring_window: Duration::from_millis(config.monitoring_window_ms),
            success_threshold: CIRCUIT_BREAKER_SUCCESS_THRESHOLD,
        }
    }
}

/// Full cache layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Master switch: when false, `connect()` is a no-op and the service
    /// behaves as permanently unavailable
    pub enabled: bool,
    pub backend: BackendKind,
    pub redis: RedisConfig,
    pub breaker: BreakerConfig,
    pub compression_enabled: bool,
    /// Ceiling on a single serialized entry, enforced in `set`
    pub max_item_size_kb: u64,
    pub metrics_enabled: bool,
    pub log_level: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: BackendKind::Redis,
            redis: RedisConfig::default(),
            breaker: BreakerConfig::default(),
            compression_enabled: true,
            max_item_size_kb: DEFAULT_MAX_ITEM_SIZE_KB,
            metrics_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

impl CacheConfig {
    /// Validate the configuration, aggregating every violation
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();

        if self.backend == BackendKind::Redis && self.enabled {
            if self.redis.host.trim().is_empty() {
                violations.push("redis.host must not be empty".to_string());
            }
            if self.redis.port == 0 {
                violations.push("redis.port must be in 1-65535".to_string());
            }
            if !(0..=15).contains(&self.redis.db) {
                violations.push(format!("redis.db must be in 0-15, got {}", self.redis.db));
            }
            if self.redis.connect_timeout_ms == 0 {
                violations.push("redis.connect_timeout_ms must be positive".to_string());
            }
        }

        if self.breaker.failure_threshold == 0 {
            violations.push("breaker.failure_threshold must be positive".to_string());
        }
        if self.breaker.reset_timeout_ms == 0 {
            violations.push("breaker.reset_timeout_ms must be positive".to_string());
        }
        if self.breaker.monitoring_window_ms == 0 {
            violations.push("breaker.monitoring_window_ms must be positive".to_string());
        }

        if self.max_item_size_kb == 0 || self.max_item_size_kb > MAX_ITEM_SIZE_CEILING_KB {
            violations.push(format!(
                "max_item_size_kb must be in 1-{MAX_ITEM_SIZE_CEILING_KB}, got {}",
                self.max_item_size_kb
            ));
        }

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            violations.push(format!("log_level must be one of {LEVELS:?}"));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::config(format!(
                "invalid cache configuration: {}",
                violations.join("; ")
            )))
        }
    }
}

/// Configuration loader service
#[derive(Clone)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources
    ///
    /// Sources are merged in this order (later sources override earlier):
    /// 1. Default values from `CacheConfig::default()`
    /// 2. TOML configuration file (if present)
    /// 3. Environment variables with prefix (e.g. `JNCACHE_REDIS__HOST`)
    pub fn load(&self) -> Result<CacheConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(CacheConfig::default()));

        if let Some(config_path) = &self.config_path {
            if config_path.exists() {
                figment = figment.merge(Toml::file(config_path));
            }
        } else {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILENAME);
            if default_path.exists() {
                figment = figment.merge(Toml::file(&default_path));
            }
        }

        // Double underscore keeps snake_case keys intact while still
        // supporting nested sections (JNCACHE_REDIS__HOST -> redis.host)
        figment = figment.merge(Env::prefixed(&format!("{}_", self.env_prefix)).split("__"));

        let config: CacheConfig = figment
            .extract()
            .map_err(|e| Error::config(format!("failed to extract configuration: {e}")))?;

        config.validate()?;

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
