//! Configuration loader with layered sources.

use crate::{AppConfig, CacheDeployment};
use config::{Config, ConfigError, Environment, File};
use feedgate_core::{GatewayError, GatewayResult};
use std::path::Path;
use tracing::{debug, info};

/// Configuration loader.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a loader reading from `config_dir`.
    pub fn new(config_dir: impl Into<String>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Creates a loader for the default location (`./config`).
    #[must_use]
    pub fn from_default_location() -> Self {
        Self::new("./config")
    }

    /// Loads and validates the configuration.
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. `.env` file in the working directory
    /// 2. `{config_dir}/default.toml`
    /// 3. `{config_dir}/{environment}.toml`
    /// 4. `{config_dir}/local.toml`
    /// 5. Environment variables with the `FEEDGATE__` prefix, e.g.
    ///    `FEEDGATE__CACHE__DEPLOYMENT_TYPE=2`
    pub fn load(&self) -> GatewayResult<AppConfig> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("FEEDGATE_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();
        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", self.config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("FEEDGATE")
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = builder
            .build()
            .and_then(Config::try_deserialize::<AppConfig>)
            .map_err(config_error_to_gateway_error)?;

        validate_config(&app_config)?;
        Ok(app_config)
    }
}

/// Validates the configuration.
pub fn validate_config(config: &AppConfig) -> GatewayResult<()> {
    match config.cache.deployment() {
        CacheDeployment::Standalone => {
            if config.redis.address.trim().is_empty() {
                return Err(GatewayError::configuration("redis.address is required"));
            }
            if config.redis.pool_size == 0 {
                return Err(GatewayError::configuration("redis.pool_size must be positive"));
            }
        }
        CacheDeployment::Cluster => {
            if config.redis_cluster.urls().is_empty() {
                return Err(GatewayError::configuration(
                    "redis_cluster.addresses must name at least one node",
                ));
            }
            if config.redis_cluster.pool_size == 0 {
                return Err(GatewayError::configuration(
                    "redis_cluster.pool_size must be positive",
                ));
            }
        }
        CacheDeployment::InMemory => {}
    }

    if config.xero.client_id.is_empty() || config.xero.client_secret.is_empty() {
        return Err(GatewayError::configuration(
            "xero.client_id and xero.client_secret are required",
        ));
    }

    Ok(())
}

fn config_error_to_gateway_error(err: ConfigError) -> GatewayError {
    GatewayError::Configuration(err.to_string())
}
