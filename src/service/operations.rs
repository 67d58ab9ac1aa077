//! Cache operations
//!
//! The public get/set/delete/invalidate surface. Every method here is total:
//! backend failures are logged, fed to the circuit breaker, counted in
//! metrics, and converted into a caller-visible miss/false/zero.

use super::CacheService;
use crate::constants::{DEFAULT_TTL_SECS, SCAN_BATCH_SIZE};
use crate::{codec, keys};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Instant;

impl CacheService {
    /// Get a value from the cache
    ///
    /// Returns `None` on a miss, an unavailable circuit, or any internal
    /// error. Exactly one of hit/miss/error is counted per call.
    pub async fn get<T>(&self, entity: &str, operation: &str, identifier: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let started = Instant::now();
        let key = keys::build_key(entity, operation, identifier);

        let Some(backend) = self.available_backend().await else {
            self.inner.metrics.record_miss();
            return None;
        };

        let outcome = backend.get(&key).await;
        self.inner.metrics.record_latency(started);

        match outcome {
            Ok(Some(stored)) => match codec::deserialize(&stored) {
                Ok(value) => {
                    self.inner.breaker.record_success();
                    self.inner.metrics.record_hit();
                    Some(value)
                }
                Err(e) => {
                    // Corrupted entry; not a backend fault
                    tracing::warn!(key = %key, "failed to decode cached entry: {e}");
                    self.inner.metrics.record_error();
                    None
                }
            },
            Ok(None) => {
                self.inner.breaker.record_success();
                self.inner.metrics.record_miss();
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, "cache get failed: {e}");
                self.inner.breaker.record_failure();
                self.inner.metrics.record_error();
                None
            }
        }
    }

    /// Set a value with atomic expire-on-write
    ///
    /// Returns `false` on unavailability, an oversize payload, or any
    /// internal error. Oversize is a deliberate silent drop: a cache write
    /// must never break the caller's primary path.
    pub async fn set<T>(
        &self,
        entity: &str,
        operation: &str,
        identifier: &str,
        value: &T,
        ttl_secs: Option<u64>,
    ) -> bool
    where
        T: Serialize + Sync,
    {
        let started = Instant::now();
        let key = keys::build_key(entity, operation, identifier);

        let Some(backend) = self.available_backend().await else {
            return false;
        };

        let payload = match codec::serialize(value, self.inner.config.compression_enabled) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(key = %key, "cache serialization failed: {e}");
                self.inner.metrics.record_error();
                return false;
            }
        };

        let max_bytes = self.inner.config.max_item_size_kb * 1024;
        if payload.len() as u64 > max_bytes {
            tracing::warn!(
                key = %key,
                size_kb = payload.len() / 1024,
                limit_kb = self.inner.config.max_item_size_kb,
                "cache entry over size limit, skipping write"
            );
            return false;
        }

        let ttl = ttl_secs.unwrap_or(DEFAULT_TTL_SECS);
        let outcome = backend.set_ex(&key, &payload, ttl).await;
        self.inner.metrics.record_latency(started);

        match outcome {
            Ok(()) => {
                self.inner.breaker.record_success();
                self.inner.metrics.record_set();
                true
            }
            Err(e) => {
                tracing::warn!(key = %key, "cache set failed: {e}");
                self.inner.breaker.record_failure();
                self.inner.metrics.record_error();
                false
            }
        }
    }

    /// Remove exactly one key, returning the number removed (0 or 1)
    pub async fn delete(&self, entity: &str, operation: &str, identifier: &str) -> u64 {
        let started = Instant::now();
        let key = keys::build_key(entity, operation, identifier);

        let Some(backend) = self.available_backend().await else {
            return 0;
        };

        let outcome = backend.delete(&key).await;
        self.inner.metrics.record_latency(started);

        match outcome {
            Ok(removed) => {
                self.inner.breaker.record_success();
                self.inner.metrics.record_delete();
                removed
            }
            Err(e) => {
                tracing::warn!(key = %key, "cache delete failed: {e}");
                self.inner.breaker.record_failure();
                self.inner.metrics.record_error();
                0
            }
        }
    }

    /// Delete all keys matching `{app}:{entity}:{operation}:*`
    ///
    /// Iterates the key space with a cursor-based scan in bounded batches so
    /// the backing store is never stalled by a full-keyspace listing. Mid-scan
    /// errors are logged and swallowed; the accumulated partial count is
    /// returned.
    pub async fn invalidate_pattern(&self, entity: &str, operation: &str) -> u64 {
        let Some(backend) = self.available_backend().await else {
            return 0;
        };

        let pattern = keys::build_invalidation_pattern(entity, operation);
        tracing::info!(pattern = %pattern, "invalidating cache entries");

        let mut cursor = 0u64;
        let mut total = 0u64;
        loop {
            let (next, batch) = match backend.scan(cursor, &pattern, SCAN_BATCH_SIZE).await {
                Ok(step) => step,
                Err(e) => {
                    tracing::warn!(pattern = %pattern, "cache scan failed mid-iteration: {e}");
                    self.inner.breaker.record_failure();
                    return total;
                }
            };

            if !batch.is_empty() {
                match backend.delete_many(&batch).await {
                    Ok(removed) => total += removed,
                    Err(e) => {
                        tracing::warn!(pattern = %pattern, "cache batch delete failed: {e}");
                        self.inner.breaker.record_failure();
                        return total;
                    }
                }
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        self.inner.breaker.record_success();
        tracing::info!(pattern = %pattern, deleted = total, "cache invalidation complete");
        total
    }

    /// Invalidate the entire application namespace
    pub async fn clear(&self) -> u64 {
        tracing::warn!("clearing entire cache namespace");
        self.invalidate_pattern("*", "*").await
    }
}
