//! Application configuration structures.

use crate::CacheDeployment;
use serde::Deserialize;
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Cache backend selection.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Single-node Redis configuration.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Redis cluster configuration.
    #[serde(default)]
    pub redis_cluster: RedisClusterConfig,

    /// Xero client credentials.
    #[serde(default)]
    pub xero: XeroConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "feedgate".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// REST server host.
    pub host: String,
    /// REST server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Returns the REST server address.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Cache backend selection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend discriminant: 1 standalone Redis, 2 Redis cluster,
    /// anything else the in-process store.
    pub deployment_type: i64,
    /// Interval for purging expired in-process entries; 0 disables the sweep.
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    /// Returns the decoded backend deployment.
    #[must_use]
    pub const fn deployment(&self) -> CacheDeployment {
        CacheDeployment::from_discriminant(self.deployment_type)
    }

    /// Returns the sweep interval, or `None` when sweeping is disabled.
    #[must_use]
    pub const fn sweep_interval(&self) -> Option<Duration> {
        if self.sweep_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.sweep_interval_secs))
        }
    }
}

/// Single-node Redis configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// `host:port` of the Redis node.
    pub address: String,
    /// Optional password.
    pub password: Option<String>,
    /// Database index.
    pub db: u32,
    /// Maximum connections in the pool.
    pub pool_size: usize,
    /// Connections opened eagerly at startup.
    pub min_idle_conns: usize,
    /// Seconds to wait for a pooled connection.
    pub pool_timeout_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            address: "localhost:6379".to_string(),
            password: None,
            db: 0,
            pool_size: 10,
            min_idle_conns: 1,
            pool_timeout_secs: 5,
        }
    }
}

impl RedisConfig {
    /// Builds the `redis://` connection URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}/{}", redis_url(&self.address, self.password.as_deref()), self.db)
    }

    /// Returns the pool wait timeout as a Duration.
    #[must_use]
    pub const fn pool_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_timeout_secs)
    }
}

/// Redis cluster configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisClusterConfig {
    /// Seed node addresses separated by `delimiter`.
    pub addresses: String,
    /// Separator used in `addresses`.
    pub delimiter: String,
    /// Optional password shared by all nodes.
    pub password: Option<String>,
    /// Maximum connections in the pool.
    pub pool_size: usize,
    /// Connections opened eagerly at startup.
    pub min_idle_conns: usize,
    /// Seconds to wait for a pooled connection.
    pub pool_timeout_secs: u64,
}

impl Default for RedisClusterConfig {
    fn default() -> Self {
        Self {
            addresses: "localhost:7000,localhost:7001,localhost:7002".to_string(),
            delimiter: ",".to_string(),
            password: None,
            pool_size: 10,
            min_idle_conns: 1,
            pool_timeout_secs: 5,
        }
    }
}

impl RedisClusterConfig {
    /// Builds one `redis://` URL per seed node.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        let delimiter = if self.delimiter.is_empty() { "," } else { self.delimiter.as_str() };
        self.addresses
            .split(delimiter)
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(|addr| redis_url(addr, self.password.as_deref()))
            .collect()
    }

    /// Returns the pool wait timeout as a Duration.
    #[must_use]
    pub const fn pool_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_timeout_secs)
    }
}

fn redis_url(address: &str, password: Option<&str>) -> String {
    match password.filter(|p| !p.is_empty()) {
        Some(password) => format!("redis://:{}@{}", password, address),
        None => format!("redis://{}", address),
    }
}

/// Xero custom-connection credentials.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct XeroConfig {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

impl std::fmt::Debug for XeroConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XeroConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, pretty).
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}
