//! End-to-end cache flows against the in-process memory backend

use jobnimbus_mcp_cache::{BackendKind, CacheConfig, CacheService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Job {
    jnid: String,
    status: String,
}

fn memory_config() -> CacheConfig {
    CacheConfig {
        backend: BackendKind::Memory,
        ..Default::default()
    }
}

async fn connected_service(config: CacheConfig) -> CacheService {
    let service = CacheService::new(config).expect("config should validate");
    service.connect().await;
    service
}

#[tokio::test]
async fn test_set_then_get_round_trip() {
    let cache = connected_service(memory_config()).await;
    let job = Job {
        jnid: "j-100".to_string(),
        status: "approved".to_string(),
    };

    assert!(cache.set("jobs", "get", "j-100", &job, None).await);
    let cached: Option<Job> = cache.get("jobs", "get", "j-100").await;
    assert_eq!(cached, Some(job));
}

#[tokio::test]
async fn test_get_miss_returns_none() {
    let cache = connected_service(memory_config()).await;
    let cached: Option<Job> = cache.get("jobs", "get", "missing").await;
    assert!(cached.is_none());
}

#[tokio::test]
async fn test_delete_counts_removed_keys() {
    let cache = connected_service(memory_config()).await;
    cache.set("tasks", "get", "t-1", &"todo", None).await;

    assert_eq!(cache.delete("tasks", "get", "t-1").await, 1);
    assert_eq!(cache.delete("tasks", "get", "t-1").await, 0);
}

#[tokio::test]
async fn test_invalidate_pattern_is_scoped_to_entity() {
    let cache = connected_service(memory_config()).await;
    cache.set("contacts", "list", "page:1", &"a", None).await;
    cache.set("contacts", "list", "page:2", &"b", None).await;
    cache.set("jobs", "list", "page:1", &"c", None).await;

    assert_eq!(cache.invalidate_pattern("contacts", "*").await, 2);

    let contacts: Option<String> = cache.get("contacts", "list", "page:1").await;
    let jobs: Option<String> = cache.get("jobs", "list", "page:1").await;
    assert!(contacts.is_none());
    assert_eq!(jobs.as_deref(), Some("c"));
}

#[tokio::test]
async fn test_clear_empties_namespace() {
    let cache = connected_service(memory_config()).await;
    cache.set("contacts", "get", "c-1", &"x", None).await;
    cache.set("estimates", "list", "all", &"y", None).await;

    assert_eq!(cache.clear().await, 2);
    let stats = cache.stats().await;
    assert_eq!(stats.key_count, Some(0));
}

#[tokio::test]
async fn test_oversize_write_is_dropped() {
    let config = CacheConfig {
        compression_enabled: false,
        ..memory_config()
    };
    let cache = connected_service(config).await;

    // 10MB payload against the default 512KB ceiling
    let huge = "x".repeat(10 * 1024 * 1024);
    assert!(!cache.set("attachments", "get", "a-1", &huge, None).await);

    let cached: Option<String> = cache.get("attachments", "get", "a-1").await;
    assert!(cached.is_none());
}

#[tokio::test]
async fn test_size_boundary_is_inclusive() {
    let config = CacheConfig {
        compression_enabled: false,
        max_item_size_kb: 1,
        ..memory_config()
    };
    let cache = connected_service(config).await;

    // JSON string encoding adds two quote characters
    let exactly_1kb = "x".repeat(1022);
    let one_over = "x".repeat(1023);
    assert!(cache.set("files", "get", "fits", &exactly_1kb, None).await);
    assert!(!cache.set("files", "get", "over", &one_over, None).await);
}

#[tokio::test]
async fn test_with_cache_hit_bypasses_fetch() {
    let cache = connected_service(memory_config()).await;
    cache
        .set("jobs", "list", "page:1", &"cached".to_string(), None)
        .await;

    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fetches);
    let result: Result<String, String> = cache
        .with_cache("jobs", "list", "page:1", None, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("fresh".to_string())
        })
        .await;

    assert_eq!(result.unwrap(), "cached");
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_with_cache_miss_fetches_once_and_stores() {
    let cache = connected_service(memory_config()).await;

    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fetches);
    let result: Result<String, String> = cache
        .with_cache("jobs", "list", "page:9", None, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("fresh".to_string())
        })
        .await;

    assert_eq!(result.unwrap(), "fresh");
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    // The background store is detached; give it a moment to settle
    tokio::time::sleep(Duration::from_millis(100)).await;
    let cached: Option<String> = cache.get("jobs", "list", "page:9").await;
    assert_eq!(cached.as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_with_cache_propagates_origin_errors() {
    let cache = connected_service(memory_config()).await;

    let result: Result<String, String> = cache
        .with_cache("jobs", "list", "page:1", None, || async {
            Err("upstream 503".to_string())
        })
        .await;

    assert_eq!(result.unwrap_err(), "upstream 503");
}

#[tokio::test]
async fn test_with_cache_propagates_origin_errors_when_disabled() {
    let config = CacheConfig {
        enabled: false,
        ..memory_config()
    };
    let cache = connected_service(config).await;

    let result: Result<String, String> = cache
        .with_cache("jobs", "list", "page:1", None, || async {
            Err("upstream 503".to_string())
        })
        .await;

    assert_eq!(result.unwrap_err(), "upstream 503");
}

#[tokio::test]
async fn test_disabled_cache_behaves_as_permanent_miss() {
    let config = CacheConfig {
        enabled: false,
        ..memory_config()
    };
    let cache = connected_service(config).await;

    assert!(!cache.set("jobs", "get", "j-1", &"v", None).await);
    let cached: Option<String> = cache.get("jobs", "get", "j-1").await;
    assert!(cached.is_none());
    assert_eq!(cache.delete("jobs", "get", "j-1").await, 0);
    assert_eq!(cache.clear().await, 0);
}

#[tokio::test]
async fn test_all_operations_total_without_backend() {
    // Never connected: every operation degrades, none panics or errors
    let cache = CacheService::new(CacheConfig::default()).expect("config should validate");

    let cached: Option<String> = cache.get("jobs", "get", "j-1").await;
    assert!(cached.is_none());
    assert!(!cache.set("jobs", "get", "j-1", &"v", None).await);
    assert_eq!(cache.delete("jobs", "get", "j-1").await, 0);
    assert_eq!(cache.invalidate_pattern("jobs", "*").await, 0);
    assert_eq!(cache.clear().await, 0);

    let health = cache.health_check().await;
    assert!(!health.healthy);
    assert!(!health.connected);

    let stats = cache.stats().await;
    assert!(stats.backend.is_none());
    assert!(!stats.connected);
}

#[tokio::test]
async fn test_stats_track_hits_and_misses() {
    let cache = connected_service(memory_config()).await;
    cache.set("jobs", "get", "j-1", &"v", None).await;

    let _: Option<String> = cache.get("jobs", "get", "j-1").await;
    let _: Option<String> = cache.get("jobs", "get", "j-1").await;
    let _: Option<String> = cache.get("jobs", "get", "missing").await;

    let stats = cache.stats().await;
    assert_eq!(stats.metrics.hits, 2);
    assert_eq!(stats.metrics.misses, 1);
    assert_eq!(stats.metrics.sets, 1);
    assert!((stats.metrics.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.backend, Some("memory"));
    assert!(stats.connected);
}

#[tokio::test]
async fn test_health_check_reports_latency() {
    let cache = connected_service(memory_config()).await;
    let health = cache.health_check().await;
    assert!(health.healthy);
    assert!(health.connected);
    assert!(health.latency_ms.is_some());
}
