//! Cache backends
//!
//! The service talks to its backing store through the [`CacheBackend`] trait.
//! Two implementations ship: [`RedisBackend`] for shared deployments and
//! [`MemoryBackend`] for single-instance use. Both provide atomic
//! expire-on-write storage; races between concurrent callers resolve
//! last-write-wins with no additional locking in this layer.

mod memory;
mod redis;

pub use memory::MemoryBackend;
pub use redis::RedisBackend;

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Backing-store introspection for `stats()`
///
/// Fields are independently optional: a failed probe leaves its field `None`
/// without failing the whole call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackendInfo {
    pub connected: bool,
    pub uptime_secs: Option<u64>,
    pub used_memory_bytes: Option<u64>,
    pub key_count: Option<u64>,
}

/// Storage operations required by the cache service
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Lightweight reachability round trip
    async fn ping(&self) -> Result<()>;

    /// Fetch a stored value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value with atomic expire-on-write
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// Remove one key, returning the number of keys removed (0 or 1)
    async fn delete(&self, key: &str) -> Result<u64>;

    /// Remove a batch of keys, returning the number removed
    async fn delete_many(&self, keys: &[String]) -> Result<u64>;

    /// One step of a cursor-based scan for keys matching a glob pattern
    ///
    /// Returns the next cursor and the batch of matched keys; a returned
    /// cursor of 0 means the iteration is complete.
    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)>;

    /// Best-effort introspection; failed probes yield `None` fields
    async fn info(&self) -> BackendInfo;

    /// Whether the underlying connection currently reports ready
    fn is_ready(&self) -> bool;

    /// Short backend identifier for logs and stats
    fn backend_name(&self) -> &'static str;
}
