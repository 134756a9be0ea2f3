//! # Feedgate Server
//!
//! Entry point for the bank-feed gateway.

use anyhow::Context;
use feedgate_config::ConfigLoader;
use feedgate_core::{init_logging, with_bootstrap_logging, GatewayError, GatewayResult, LogFormat};
use feedgate_server::{app::AppState, health, startup};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Application error: {}", e);
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> GatewayResult<()> {
    let config = with_bootstrap_logging(|| ConfigLoader::from_default_location().load())?;
    init_logging(
        &config.observability.log_level,
        LogFormat::parse(&config.observability.log_format),
    )?;

    info!("Starting Feedgate server...");
    let state = AppState::from_config(&config).await?;

    let router = health::router(state.clone()).layer(TraceLayer::new_for_http());
    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    startup::print_startup_info(&config);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GatewayError::internal(format!("REST server error: {}", e)));

    if let Err(e) = state.shutdown().await {
        warn!("Failed to close cache: {}", e);
    }

    served?;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
