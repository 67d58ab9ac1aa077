//! Redis backend
//!
//! Single multiplexed connection per process, shared by all callers via the
//! driver's `ConnectionManager` (auto-reconnect with bounded backoff).
//! Readiness is tracked from operation outcomes: any connection-level failure
//! marks the backend not ready until a round trip succeeds again.

use super::{BackendInfo, CacheBackend};
use crate::config::RedisConfig;
use crate::error::Result;
use async_trait::async_trait;
use redis::Client;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Redis cache backend
#[derive(Clone)]
pub struct RedisBackend {
    manager: ConnectionManager,
    ready: Arc<AtomicBool>,
}

impl RedisBackend {
    /// Connect to Redis and verify reachability with a PING
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(Self::connection_url(config))?;

        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(Some(Duration::from_millis(config.connect_timeout_ms)))
            .set_response_timeout(Some(Duration::from_millis(config.connect_timeout_ms)))
            .set_number_of_retries(config.max_retries as usize);

        let manager = ConnectionManager::new_with_config(client, manager_config).await?;

        let backend = Self {
            manager,
            ready: Arc::new(AtomicBool::new(false)),
        };
        backend.ping().await?;

        Ok(backend)
    }

    /// Build the connection URL from the configured parameters
    ///
    /// TLS uses the `rediss` scheme; the `#insecure` fragment disables
    /// certificate verification when explicitly requested.
    fn connection_url(config: &RedisConfig) -> String {
        let scheme = if config.tls { "rediss" } else { "redis" };
        let auth = config
            .password
            .as_deref()
            .map(|password| format!(":{password}@"))
            .unwrap_or_default();
        let insecure = if config.tls && !config.verify_certificates {
            "#insecure"
        } else {
            ""
        };
        format!(
            "{scheme}://{auth}{}:{}/{}{insecure}",
            config.host, config.port, config.db
        )
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }

    /// Track readiness off the outcome of every round trip
    fn observe<T>(&self, outcome: redis::RedisResult<T>) -> Result<T> {
        match outcome {
            Ok(value) => {
                self.ready.store(true, Ordering::Relaxed);
                Ok(value)
            }
            Err(e) => {
                if e.is_connection_dropped() || e.is_io_error() || e.is_timeout() {
                    self.ready.store(false, Ordering::Relaxed);
                }
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn();
        let outcome = redis::cmd("PING").query_async::<()>(&mut conn).await;
        self.observe(outcome)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn();
        let outcome = redis::cmd("GET")
            .arg(key)
            .query_async::<Option<String>>(&mut conn)
            .await;
        self.observe(outcome)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.conn();
        let outcome = redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_secs)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await;
        self.observe(outcome)
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn();
        let outcome = redis::cmd("DEL").arg(key).query_async::<u64>(&mut conn).await;
        self.observe(outcome)
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn();
        let outcome = redis::cmd("DEL").arg(keys).query_async::<u64>(&mut conn).await;
        self.observe(outcome)
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)> {
        let mut conn = self.conn();
        let outcome = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async::<(u64, Vec<String>)>(&mut conn)
            .await;
        self.observe(outcome)
    }

    async fn info(&self) -> BackendInfo {
        let mut info = BackendInfo {
            connected: self.is_ready(),
            ..Default::default()
        };

        let mut conn = self.conn();
        if let Ok(raw) = redis::cmd("INFO")
            .arg("server")
            .query_async::<String>(&mut conn)
            .await
        {
            info.uptime_secs = parse_info_field(&raw, "uptime_in_seconds");
        }
        if let Ok(raw) = redis::cmd("INFO")
            .arg("memory")
            .query_async::<String>(&mut conn)
            .await
        {
            info.used_memory_bytes = parse_info_field(&raw, "used_memory");
        }
        if let Ok(count) = redis::cmd("DBSIZE").query_async::<u64>(&mut conn).await {
            info.key_count = Some(count);
        }

        info
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

/// Extract a numeric field from an INFO section (`field:value` lines)
fn parse_info_field(raw: &str, field: &str) -> Option<u64> {
    raw.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| *name == field)
        .and_then(|(_, value)| value.trim().parse().ok())
}
