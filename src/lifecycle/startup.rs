//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start background tasks (config watcher, signal handling, metrics)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener starts last (traffic only when ready)

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::watcher::ConfigWatcher;
use crate::config::{ConfigError, GatewayConfig, PLACEHOLDER_API_KEY};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Fatal startup failures.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to watch config file: {0}")]
    Watch(#[from] notify::Error),
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Start the gateway and serve until a shutdown signal arrives.
pub async fn run(config: GatewayConfig, config_path: Option<PathBuf>) -> Result<(), StartupError> {
    if config.backend.api_key == PLACEHOLDER_API_KEY {
        tracing::warn!("API_KEY is the development placeholder; set API_KEY before deploying");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        api_url = %config.backend.api_url,
        strict_endpoints = config.endpoints.strict,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let _watcher = match &config_path {
        Some(path) => Some(ConfigWatcher::new(path, update_tx.clone()).run()?),
        None => None,
    };

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signals::handle_signals(&signal_shutdown, config_path, update_tx).await {
            tracing::error!(error = %e, "Signal handling failed, shutting down");
            signal_shutdown.trigger();
        }
    });

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: bind_address.clone(),
            source,
        })?;

    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    server.run(listener, update_rx, server_shutdown).await?;
    Ok(())
}
