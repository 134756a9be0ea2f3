//! # Feedgate Cache
//!
//! A uniform key/value-with-expiry contract ([`CacheEngine`]) with three
//! interchangeable backends. Exactly one backend is chosen at startup by
//! [`new_cache_engine`] and shared for the lifetime of the process.

mod cache_interface;
mod factory;
mod memory_cache;
mod redis_cache;
mod redis_cluster_cache;

pub use cache_interface::{CacheEngine, CacheExt};
pub use factory::new_cache_engine;
pub use memory_cache::MemoryCache;
pub use redis_cache::RedisCache;
pub use redis_cluster_cache::RedisClusterCache;
