//! Redis cluster cache backend.

use super::redis_cache::{backend_error, delete_key, flush_db, get_bytes, ping, pool_config, set_bytes};
use super::CacheEngine;
use async_trait::async_trait;
use deadpool_redis::cluster::{Config, Connection, Pool};
use deadpool_redis::Runtime;
use feedgate_config::RedisClusterConfig;
use feedgate_core::GatewayResult;
use std::time::Duration;
use tracing::{debug, info};

/// Cache backed by a Redis cluster.
///
/// Keys are routed to their slot owner by the cluster client. `reset`
/// issues `FLUSHDB`, which the client broadcasts to every primary.
pub struct RedisClusterCache {
    pool: Pool,
}

impl RedisClusterCache {
    /// Creates the pool from the seed nodes and verifies the cluster is
    /// reachable.
    pub async fn connect(config: &RedisClusterConfig) -> GatewayResult<Self> {
        let urls = config.urls();
        info!("Connecting to Redis cluster with {} seed nodes", urls.len());

        let mut cfg = Config::from_urls(urls);
        cfg.pool = Some(pool_config(config.pool_size, config.pool_timeout()));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| backend_error("Failed to create Redis cluster pool", e))?;

        let cache = Self { pool };
        let conns = futures::future::try_join_all(
            (0..config.min_idle_conns.min(config.pool_size)).map(|_| cache.get_conn()),
        )
        .await?;
        debug!("Opened {} idle Redis cluster connections", conns.len());
        drop(conns);

        cache.ping().await?;
        info!("Redis cluster cache ready");
        Ok(cache)
    }

    async fn get_conn(&self) -> GatewayResult<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| backend_error("Failed to get Redis cluster connection", e))
    }
}

#[async_trait]
impl CacheEngine for RedisClusterCache {
    async fn get(&self, key: &str) -> GatewayResult<Vec<u8>> {
        let mut conn = self.get_conn().await?;
        get_bytes(&mut conn, key).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> GatewayResult<()> {
        let mut conn = self.get_conn().await?;
        set_bytes(&mut conn, key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> GatewayResult<()> {
        let mut conn = self.get_conn().await?;
        delete_key(&mut conn, key).await
    }

    async fn reset(&self) -> GatewayResult<()> {
        let mut conn = self.get_conn().await?;
        flush_db(&mut conn).await
    }

    async fn close(&self) -> GatewayResult<()> {
        self.pool.close();
        info!("Redis cluster pool closed");
        Ok(())
    }

    async fn ping(&self) -> GatewayResult<()> {
        let mut conn = self.get_conn().await?;
        ping(&mut conn).await
    }
}
