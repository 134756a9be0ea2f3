//! Cache engine trait for abstracted caching operations.

use async_trait::async_trait;
use feedgate_core::{GatewayError, GatewayResult};
use std::time::Duration;

/// Key/value store with per-entry expiry.
///
/// Keys are opaque strings and values opaque bytes. Implementations must
/// never return an entry whose expiry has passed; an expired entry is
/// reported exactly like one that was never stored.
///
/// Network-bound operations can be cancelled by dropping the returned
/// future; no implementation applies its own timeout beyond the pool wait.
#[async_trait]
pub trait CacheEngine: Send + Sync {
    /// Returns the stored bytes, or [`GatewayError::CacheMiss`] when the key
    /// is absent or expired.
    async fn get(&self, key: &str) -> GatewayResult<Vec<u8>>;

    /// Stores `value` until `now + ttl`, replacing any previous entry.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> GatewayResult<()>;

    /// Removes the entry. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> GatewayResult<()>;

    /// Removes every entry held by the backend.
    async fn reset(&self) -> GatewayResult<()>;

    /// Releases backend resources. Called once at shutdown.
    async fn close(&self) -> GatewayResult<()>;

    /// Liveness probe.
    async fn ping(&self) -> GatewayResult<()>;
}

/// Typed helpers over [`CacheEngine`] storing values as JSON.
#[async_trait]
pub trait CacheExt: CacheEngine {
    /// Get a typed value, mapping a miss to `None`.
    async fn get_json<T: serde::de::DeserializeOwned + Send>(&self, key: &str) -> GatewayResult<Option<T>> {
        match self.get(key).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(GatewayError::CacheMiss) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a typed value.
    async fn set_json<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> GatewayResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, &bytes, ttl).await
    }
}

impl<T: CacheEngine + ?Sized> CacheExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCache;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Statement {
        id: String,
        lines: u32,
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let cache = MemoryCache::new();
        let statement = Statement {
            id: "stmt-1".to_string(),
            lines: 4,
        };

        cache
            .set_json("statement:1", &statement, Duration::from_secs(60))
            .await
            .unwrap();

        let loaded: Option<Statement> = cache.get_json("statement:1").await.unwrap();
        assert_eq!(loaded, Some(statement));
    }

    #[tokio::test]
    async fn test_json_helpers_map_miss_to_none() {
        let cache = MemoryCache::new();
        let loaded: Option<Statement> = cache.get_json("absent").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_json_helpers_report_bad_payload() {
        let cache = MemoryCache::new();
        cache.set("raw", b"not json", Duration::from_secs(60)).await.unwrap();

        let err = cache.get_json::<Statement>("raw").await.unwrap_err();
        assert!(matches!(err, GatewayError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_helpers_work_through_trait_objects() {
        let cache: std::sync::Arc<dyn CacheEngine> = std::sync::Arc::new(MemoryCache::new());
        cache.set_json("n", &42u32, Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get_json::<u32>("n").await.unwrap(), Some(42));
    }
}
