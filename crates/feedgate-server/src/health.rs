//! Health check routes.

use crate::app::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: &'static str,
    /// Application version.
    pub version: &'static str,
    /// Active cache backend.
    pub cache_backend: String,
    /// Whether the cache answered a ping.
    pub cache_reachable: bool,
}

/// Creates the health router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
        .with_state(state)
}

/// Reports version and cache reachability.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let cache_reachable = match state.cache.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Cache ping failed: {}", e);
            false
        }
    };

    let status = if cache_reachable { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let body = HealthResponse {
        status: if cache_reachable { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        cache_backend: state.deployment.to_string(),
        cache_reachable,
    };
    (status, Json(body))
}

/// Ready once the cache answers.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.cache.ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Liveness check endpoint.
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use feedgate_cache::MemoryCache;
    use feedgate_config::{CacheDeployment, XeroConfig};
    use feedgate_xero::XeroSession;
    use std::sync::Arc;
    use support::FailingCache;
    use tower::ServiceExt;

    mod support {
        use feedgate_cache::CacheEngine;
        use feedgate_core::{GatewayError, GatewayResult};
        use std::time::Duration;

        /// Backend whose every call fails as if Redis were down.
        pub struct FailingCache;

        fn down<T>() -> GatewayResult<T> {
            Err(GatewayError::cache_unavailable("connection refused"))
        }

        #[async_trait::async_trait]
        impl CacheEngine for FailingCache {
            async fn get(&self, _key: &str) -> GatewayResult<Vec<u8>> {
                down()
            }
            async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> GatewayResult<()> {
                down()
            }
            async fn delete(&self, _key: &str) -> GatewayResult<()> {
                down()
            }
            async fn reset(&self) -> GatewayResult<()> {
                down()
            }
            async fn close(&self) -> GatewayResult<()> {
                Ok(())
            }
            async fn ping(&self) -> GatewayResult<()> {
                down()
            }
        }
    }

    fn state(cache: Arc<dyn feedgate_cache::CacheEngine>) -> AppState {
        let xero = XeroSession::new(&XeroConfig::default()).unwrap();
        AppState::new(cache, CacheDeployment::InMemory, xero)
    }

    async fn status_of(state: AppState, uri: &str) -> StatusCode {
        router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_healthy_with_memory_cache() {
        let state = state(Arc::new(MemoryCache::new()));
        assert_eq!(status_of(state.clone(), "/health").await, StatusCode::OK);
        assert_eq!(status_of(state.clone(), "/ready").await, StatusCode::OK);
        assert_eq!(status_of(state, "/live").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unreachable_cache_reports_unavailable() {
        let state = state(Arc::new(FailingCache));
        assert_eq!(status_of(state.clone(), "/health").await, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_of(state.clone(), "/ready").await, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_of(state, "/live").await, StatusCode::OK);
    }
}
