//! OS signal handling.
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGTERM/SIGINT trigger graceful shutdown
//! - SIGHUP triggers config reload, not shutdown

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::config::watcher::reload_into;
use crate::config::GatewayConfig;
use crate::lifecycle::Shutdown;

/// Wait for signals until a shutdown signal arrives, then trigger `shutdown`.
///
/// SIGHUP reloads `config_path` (when there is one) into `updates`.
pub async fn handle_signals(
    shutdown: &Shutdown,
    config_path: Option<PathBuf>,
    updates: mpsc::UnboundedSender<GatewayConfig>,
) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        let mut hangup = signal(SignalKind::hangup())?;

        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    tracing::info!("SIGINT received");
                    break;
                }
                _ = terminate.recv() => {
                    tracing::info!("SIGTERM received");
                    break;
                }
                _ = hangup.recv() => match &config_path {
                    Some(path) => {
                        tracing::info!(path = ?path, "SIGHUP received, reloading configuration");
                        reload_into(path, &updates);
                    }
                    None => tracing::warn!("SIGHUP received but no config file is in use"),
                },
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = (&config_path, &updates);
        tokio::signal::ctrl_c().await?;
        tracing::info!("Ctrl+C received");
    }

    shutdown.trigger();
    Ok(())
}
