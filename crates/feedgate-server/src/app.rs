//! Application state construction.

use feedgate_cache::{new_cache_engine, CacheEngine};
use feedgate_config::{AppConfig, CacheDeployment};
use feedgate_core::GatewayResult;
use feedgate_xero::XeroSession;
use std::sync::Arc;
use tracing::info;

/// Shared handles passed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// The single cache backend selected at startup.
    pub cache: Arc<dyn CacheEngine>,
    /// Which backend `cache` is.
    pub deployment: CacheDeployment,
    /// Xero token manager and tenant resolver.
    pub xero: XeroSession,
}

impl AppState {
    /// Builds the state from an already-constructed cache and session.
    pub fn new(cache: Arc<dyn CacheEngine>, deployment: CacheDeployment, xero: XeroSession) -> Self {
        Self {
            cache,
            deployment,
            xero,
        }
    }

    /// Connects the configured cache backend and creates the Xero session.
    ///
    /// Cache construction failure is returned as-is; startup must abort.
    pub async fn from_config(config: &AppConfig) -> GatewayResult<Self> {
        let cache = new_cache_engine(config).await?;
        let xero = XeroSession::new(&config.xero)?;

        info!("Application state ready (cache: {})", config.cache.deployment());
        Ok(Self::new(cache, config.cache.deployment(), xero))
    }

    /// Releases the cache backend.
    pub async fn shutdown(&self) -> GatewayResult<()> {
        self.cache.close().await
    }
}
