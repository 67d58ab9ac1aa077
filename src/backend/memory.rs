//! In-process memory backend
//!
//! Moka-based backend for single-instance deployments and tests. Per-entry
//! TTLs are enforced with an expiry timestamp checked on read; moka's own
//! capacity eviction bounds memory.

use super::{BackendInfo, CacheBackend};
use crate::constants::MEMORY_BACKEND_MAX_ENTRIES;
use crate::error::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct StoredEntry {
    value: String,
    expires_at: Instant,
}

/// In-process cache backend
pub struct MemoryBackend {
    cache: Cache<String, StoredEntry>,
    started: Instant,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MEMORY_BACKEND_MAX_ENTRIES)
                .build(),
            started: Instant::now(),
        }
    }

    async fn live_entry(&self, key: &str) -> Option<StoredEntry> {
        let entry = self.cache.get(key).await?;
        if entry.expires_at <= Instant::now() {
            self.cache.invalidate(key).await;
            return None;
        }
        Some(entry)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.live_entry(key).await.map(|entry| entry.value))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let entry = StoredEntry {
            value: value.to_string(),
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        let existed = self.live_entry(key).await.is_some();
        self.cache.invalidate(key).await;
        Ok(u64::from(existed))
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64> {
        let mut removed = 0;
        for key in keys {
            removed += self.delete(key).await?;
        }
        Ok(removed)
    }

    async fn scan(&self, _cursor: u64, pattern: &str, _count: usize) -> Result<(u64, Vec<String>)> {
        // The whole key space is in memory, so one pass covers it
        let Ok(matcher) = glob::Pattern::new(pattern) else {
            return Ok((0, Vec::new()));
        };
        let now = Instant::now();
        let keys = self
            .cache
            .iter()
            .filter(|(key, entry)| entry.expires_at > now && matcher.matches(key))
            .map(|(key, _)| key.as_ref().clone())
            .collect();
        Ok((0, keys))
    }

    async fn info(&self) -> BackendInfo {
        self.cache.run_pending_tasks().await;
        BackendInfo {
            connected: true,
            uptime_secs: Some(self.started.elapsed().as_secs()),
            used_memory_bytes: None,
            key_count: Some(self.cache.entry_count()),
        }
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let backend = MemoryBackend::new();
        backend.set_ex("jobnimbus:jobs:get:1", "{}", 60).await.unwrap();

        let stored = backend.get("jobnimbus:jobs:get:1").await.unwrap();
        assert_eq!(stored.as_deref(), Some("{}"));

        assert_eq!(backend.delete("jobnimbus:jobs:get:1").await.unwrap(), 1);
        assert_eq!(backend.delete("jobnimbus:jobs:get:1").await.unwrap(), 0);
        assert!(backend.get("jobnimbus:jobs:get:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let backend = MemoryBackend::new();
        backend.set_ex("k", "v", 1).await.unwrap();
        assert!(backend.get("k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert!(backend.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scan_matches_glob() {
        let backend = MemoryBackend::new();
        backend.set_ex("jobnimbus:contacts:list:p1", "a", 60).await.unwrap();
        backend.set_ex("jobnimbus:contacts:list:p2", "b", 60).await.unwrap();
        backend.set_ex("jobnimbus:jobs:list:p1", "c", 60).await.unwrap();

        let (cursor, mut keys) = backend.scan(0, "jobnimbus:contacts:list:*", 100).await.unwrap();
        keys.sort();
        assert_eq!(cursor, 0);
        assert_eq!(
            keys,
            vec!["jobnimbus:contacts:list:p1", "jobnimbus:contacts:list:p2"]
        );
    }
}
