//! Integration tests against live Redis deployments.
//!
//! Run with:
//! `FEEDGATE_TEST_REDIS_ADDRESS=localhost:6379 cargo test -p feedgate-cache -- --ignored`
//! `FEEDGATE_TEST_REDIS_CLUSTER_NODES=localhost:7000,localhost:7001 cargo test -p feedgate-cache -- --ignored`

use feedgate_cache::{new_cache_engine, CacheEngine, CacheExt};
use feedgate_config::AppConfig;
use std::sync::Arc;
use std::time::Duration;

async fn standalone() -> Arc<dyn CacheEngine> {
    let mut config = AppConfig::default();
    config.cache.deployment_type = 1;
    config.redis.address =
        std::env::var("FEEDGATE_TEST_REDIS_ADDRESS").unwrap_or_else(|_| "localhost:6379".to_string());
    config.redis.db = 15;
    new_cache_engine(&config).await.expect("Redis must be reachable")
}

async fn cluster() -> Arc<dyn CacheEngine> {
    let mut config = AppConfig::default();
    config.cache.deployment_type = 2;
    config.redis_cluster.addresses = std::env::var("FEEDGATE_TEST_REDIS_CLUSTER_NODES")
        .unwrap_or_else(|_| "localhost:7000,localhost:7001,localhost:7002".to_string());
    new_cache_engine(&config).await.expect("Redis cluster must be reachable")
}

async fn exercise_contract(cache: Arc<dyn CacheEngine>) {
    cache.ping().await.unwrap();
    cache.reset().await.unwrap();

    cache.set("feedgate:test:x", b"hello", Duration::from_millis(100)).await.unwrap();
    assert_eq!(cache.get("feedgate:test:x").await.unwrap(), b"hello");

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(cache.get("feedgate:test:x").await.unwrap_err().is_cache_miss());

    cache.delete("feedgate:test:never-set").await.unwrap();
    assert!(cache.get("feedgate:test:never-set").await.unwrap_err().is_cache_miss());

    cache
        .set_json("feedgate:test:json", &vec![1u32, 2, 3], Duration::from_secs(10))
        .await
        .unwrap();
    assert_eq!(
        cache.get_json::<Vec<u32>>("feedgate:test:json").await.unwrap(),
        Some(vec![1, 2, 3])
    );

    cache.reset().await.unwrap();
    assert!(cache.get("feedgate:test:json").await.unwrap_err().is_cache_miss());

    cache.close().await.unwrap();
    assert!(cache.ping().await.is_err());
}

#[tokio::test]
#[ignore = "requires a running Redis node"]
async fn test_standalone_contract() {
    exercise_contract(standalone().await).await;
}

#[tokio::test]
#[ignore = "requires a running Redis cluster"]
async fn test_cluster_contract() {
    exercise_contract(cluster().await).await;
}
