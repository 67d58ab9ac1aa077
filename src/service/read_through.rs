//! Read-through helper
//!
//! The single entry point tool handlers compose with: check the cache, fall
//! back to the caller's fetch on a miss, store the fresh result in the
//! background. Origin failures are real failures and propagate unchanged;
//! cache failures are invisible.

use super::CacheService;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;

impl CacheService {
    /// Read-through lookup
    ///
    /// On a hit the cached value is returned and `fetch` is never invoked.
    /// On a miss `fetch` runs exactly once; its error, if any, is returned
    /// unchanged. A successful fetch result is handed back immediately while
    /// a detached task stores it with the given TTL (default 15 min); the
    /// store's outcome never affects the caller.
    pub async fn with_cache<T, E, F, Fut>(
        &self,
        entity: &str,
        operation: &str,
        identifier: &str,
        ttl_secs: Option<u64>,
        fetch: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(entity, operation, identifier).await {
            return Ok(cached);
        }

        let fresh = fetch().await?;

        let service = self.clone();
        let entity = entity.to_string();
        let operation = operation.to_string();
        let identifier = identifier.to_string();
        let value = fresh.clone();
        tokio::spawn(async move {
            if !service
                .set(&entity, &operation, &identifier, &value, ttl_secs)
                .await
            {
                tracing::debug!(
                    entity = %entity,
                    operation = %operation,
                    "background cache store skipped"
                );
            }
        });

        Ok(fresh)
    }
}
