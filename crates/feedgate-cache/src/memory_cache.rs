//! In-process cache backend.

use super::CacheEngine;
use async_trait::async_trait;
use feedgate_core::{GatewayError, GatewayResult};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

type Store = RwLock<HashMap<String, Entry>>;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Map-backed cache guarded by a reader/writer lock.
///
/// Expiry is checked lazily on read. Expired entries stay resident until
/// they are overwritten, deleted, reset, or removed by [`purge_expired`]
/// (or the optional sweeper started with [`MemoryCache::with_sweeper`]).
///
/// [`purge_expired`]: MemoryCache::purge_expired
#[derive(Default)]
pub struct MemoryCache {
    store: Arc<Store>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl MemoryCache {
    /// Creates an empty cache without background sweeping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache that purges expired entries every `interval`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn with_sweeper(interval: Duration) -> Self {
        let cache = Self::new();
        let store = Arc::downgrade(&cache.store);
        *cache.sweeper.lock() = Some(tokio::spawn(sweep(store, interval)));
        cache
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        purge(&self.store, Instant::now())
    }

    /// Number of physically resident entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// Returns true if no entries are resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }
}

/// TTLs past what `Instant` can represent are clamped to a century.
fn expiry_after(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(MAX_TTL))
        .unwrap_or(now)
}

fn purge(store: &Store, now: Instant) -> usize {
    let mut map = store.write();
    let before = map.len();
    map.retain(|_, entry| !entry.is_expired(now));
    before - map.len()
}

async fn sweep(store: Weak<Store>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let Some(live) = store.upgrade() else {
            break;
        };
        let removed = purge(&live, Instant::now());
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
    }
}

#[async_trait]
impl CacheEngine for MemoryCache {
    async fn get(&self, key: &str) -> GatewayResult<Vec<u8>> {
        let map = self.store.read();
        match map.get(key) {
            Some(entry) if !entry.is_expired(Instant::now()) => {
                debug!("Cache hit for key '{}'", key);
                Ok(entry.value.clone())
            }
            _ => {
                debug!("Cache miss for key '{}'", key);
                Err(GatewayError::CacheMiss)
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> GatewayResult<()> {
        let entry = Entry {
            value: value.to_vec(),
            expires_at: expiry_after(Instant::now(), ttl),
        };
        self.store.write().insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> GatewayResult<()> {
        self.store.write().remove(key);
        Ok(())
    }

    async fn reset(&self) -> GatewayResult<()> {
        self.store.write().clear();
        Ok(())
    }

    async fn close(&self) -> GatewayResult<()> {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
        Ok(())
    }

    async fn ping(&self) -> GatewayResult<()> {
        Ok(())
    }
}
