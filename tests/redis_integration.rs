//! Round-trip tests against a live Redis instance
//!
//! Skipped unless `JNCACHE_TEST_REDIS_HOST` is set, e.g.:
//! `JNCACHE_TEST_REDIS_HOST=127.0.0.1 cargo test --test redis_integration`

use jobnimbus_mcp_cache::{CacheConfig, CacheService, RedisConfig};

fn live_config() -> Option<CacheConfig> {
    let host = std::env::var("JNCACHE_TEST_REDIS_HOST").ok()?;
    let port = std::env::var("JNCACHE_TEST_REDIS_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(6379);

    Some(CacheConfig {
        redis: RedisConfig {
            host,
            port,
            // Keep test traffic off the default database
            db: 15,
            ..Default::default()
        },
        ..Default::default()
    })
}

#[tokio::test]
async fn test_redis_round_trip() {
    let Some(config) = live_config() else {
        eprintln!("JNCACHE_TEST_REDIS_HOST not set, skipping redis integration test");
        return;
    };

    let cache = CacheService::new(config).expect("config should validate");
    cache.connect().await;

    let health = cache.health_check().await;
    assert!(health.healthy, "redis should be reachable");

    assert!(cache.set("contacts", "get", "it-1", &"value".to_string(), Some(60)).await);
    let cached: Option<String> = cache.get("contacts", "get", "it-1").await;
    assert_eq!(cached.as_deref(), Some("value"));

    assert_eq!(cache.delete("contacts", "get", "it-1").await, 1);
    let gone: Option<String> = cache.get("contacts", "get", "it-1").await;
    assert!(gone.is_none());
}

#[tokio::test]
async fn test_redis_pattern_invalidation() {
    let Some(config) = live_config() else {
        eprintln!("JNCACHE_TEST_REDIS_HOST not set, skipping redis integration test");
        return;
    };

    let cache = CacheService::new(config).expect("config should validate");
    cache.connect().await;

    for page in 1..=3 {
        cache
            .set("estimates", "list", &format!("page:{page}"), &"e", Some(60))
            .await;
    }

    assert_eq!(cache.invalidate_pattern("estimates", "list").await, 3);
    let gone: Option<String> = cache.get("estimates", "list", "page:1").await;
    assert!(gone.is_none());
}
