//! Backend selection.

use crate::{CacheEngine, MemoryCache, RedisCache, RedisClusterCache};
use feedgate_config::{AppConfig, CacheDeployment};
use feedgate_core::GatewayResult;
use std::sync::Arc;
use tracing::info;

/// Builds the cache backend chosen by `cache.deployment_type`.
///
/// Called once at startup. A remote backend that cannot be reached is an
/// error; there is no fallback to the in-process store.
pub async fn new_cache_engine(config: &AppConfig) -> GatewayResult<Arc<dyn CacheEngine>> {
    let deployment = config.cache.deployment();
    info!("Selecting cache backend: {}", deployment);

    let engine: Arc<dyn CacheEngine> = match deployment {
        CacheDeployment::Standalone => Arc::new(RedisCache::connect(&config.redis).await?),
        CacheDeployment::Cluster => {
            Arc::new(RedisClusterCache::connect(&config.redis_cluster).await?)
        }
        CacheDeployment::InMemory => match config.cache.sweep_interval() {
            Some(interval) => Arc::new(MemoryCache::with_sweeper(interval)),
            None => Arc::new(MemoryCache::new()),
        },
    };

    Ok(engine)
}
