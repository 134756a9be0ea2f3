//! Server startup utilities.

use feedgate_config::AppConfig;
use tracing::info;

/// Logs where the server is listening and what it is connected to.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("{} v{} ({})", config.app.name, config.app.version, config.app.environment);
    info!("REST API:  http://{}", config.server.addr());
    info!("Health:    http://{}/health", config.server.addr());
    info!("Cache:     {}", config.cache.deployment());
    info!("{}", separator);
}
