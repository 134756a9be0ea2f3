//! Single-node Redis cache backend.

use super::CacheEngine;
use async_trait::async_trait;
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use feedgate_config::RedisConfig;
use feedgate_core::{GatewayError, GatewayResult};
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, info};

/// Cache backed by a single Redis node through a connection pool.
///
/// Expiry and eviction are delegated to Redis.
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    /// Creates the pool and verifies the node is reachable.
    ///
    /// `min_idle_conns` connections are opened eagerly; any failure here is
    /// returned so startup can abort.
    pub async fn connect(config: &RedisConfig) -> GatewayResult<Self> {
        info!("Connecting to Redis at {} (db {})", config.address, config.db);

        let mut cfg = Config::from_url(config.url());
        cfg.pool = Some(pool_config(config.pool_size, config.pool_timeout()));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| backend_error("Failed to create Redis pool", e))?;

        let cache = Self { pool };
        cache.warm_up(config.min_idle_conns.min(config.pool_size)).await?;
        cache.ping().await?;

        info!("Redis cache ready");
        Ok(cache)
    }

    async fn warm_up(&self, connections: usize) -> GatewayResult<()> {
        let conns = futures::future::try_join_all((0..connections).map(|_| self.get_conn())).await?;
        debug!("Opened {} idle Redis connections", conns.len());
        Ok(())
    }

    async fn get_conn(&self) -> GatewayResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| backend_error("Failed to get Redis connection", e))
    }
}

#[async_trait]
impl CacheEngine for RedisCache {
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
        info!("Redis pool closed");
        Ok(())
    }

    async fn ping(&self) -> GatewayResult<()> {
        let mut conn = self.get_conn().await?;
        ping(&mut conn).await
    }
}

// Command helpers shared with the cluster backend.

/// Both waiting for a pooled connection and opening a new one are bounded
/// by `timeout`.
pub(crate) fn pool_config(max_size: usize, timeout: Duration) -> PoolConfig {
    let mut pool = PoolConfig::new(max_size);
    pool.timeouts.wait = Some(timeout);
    pool.timeouts.create = Some(timeout);
    pool
}

pub(crate) fn backend_error(context: &str, err: impl Display) -> GatewayError {
    GatewayError::CacheUnavailable(format!("{}: {}", context, err))
}

/// Redis rejects a zero expiry, so sub-millisecond TTLs round up.
pub(crate) fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

pub(crate) async fn get_bytes<C: AsyncCommands>(conn: &mut C, key: &str) -> GatewayResult<Vec<u8>> {
    let value: Option<Vec<u8>> = conn
        .get(key)
        .await
        .map_err(|e| backend_error(&format!("Failed to get key '{}'", key), e))?;

    match value {
        Some(bytes) => {
            debug!("Cache hit for key '{}'", key);
            Ok(bytes)
        }
        None => {
            debug!("Cache miss for key '{}'", key);
            Err(GatewayError::CacheMiss)
        }
    }
}

pub(crate) async fn set_bytes<C: AsyncCommands>(
    conn: &mut C,
    key: &str,
    value: &[u8],
    ttl: Duration,
) -> GatewayResult<()> {
    let ttl_ms = ttl_millis(ttl);
    conn.pset_ex::<_, _, ()>(key, value, ttl_ms)
        .await
        .map_err(|e| backend_error(&format!("Failed to set key '{}'", key), e))?;

    debug!("Cached key '{}' with TTL {}ms", key, ttl_ms);
    Ok(())
}

pub(crate) async fn delete_key<C: AsyncCommands>(conn: &mut C, key: &str) -> GatewayResult<()> {
    conn.del::<_, ()>(key)
        .await
        .map_err(|e| backend_error(&format!("Failed to delete key '{}'", key), e))
}

pub(crate) async fn flush_db<C: AsyncCommands>(conn: &mut C) -> GatewayResult<()> {
    redis::cmd("FLUSHDB")
        .query_async::<()>(conn)
        .await
        .map_err(|e| backend_error("Failed to flush Redis", e))
}

pub(crate) async fn ping<C: AsyncCommands>(conn: &mut C) -> GatewayResult<()> {
    redis::cmd("PING")
        .query_async::<String>(conn)
        .await
        .map(|_| ())
        .map_err(|e| backend_error("Redis ping failed", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_millis_rounds_up() {
        assert_eq!(ttl_millis(Duration::ZERO), 1);
        assert_eq!(ttl_millis(Duration::from_micros(10)), 1);
        assert_eq!(ttl_millis(Duration::from_millis(100)), 100);
        assert_eq!(ttl_millis(Duration::from_secs(60)), 60_000);
    }

    #[test]
    fn test_pool_config() {
        let pool = pool_config(16, Duration::from_secs(3));
        assert_eq!(pool.max_size, 16);
        assert_eq!(pool.timeouts.wait, Some(Duration::from_secs(3)));
        assert_eq!(pool.timeouts.create, Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_node_fails() {
        let config = RedisConfig {
            address: "127.0.0.1:1".to_string(),
            pool_timeout_secs: 1,
            ..RedisConfig::default()
        };

        let err = RedisCache::connect(&config).await.err().unwrap();
        assert!(matches!(err, GatewayError::CacheUnavailable(_)));
    }
}
