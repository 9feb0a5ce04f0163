//! SAIF diagnostic gateway.
//!
//! Forwards dashboard requests to the diagnostics API with the API key
//! injected, and relays the API's answers unchanged.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │               DIAGNOSTIC GATEWAY             │
//!   Browser               │                                              │
//!   /api-proxy.php?...    │  ┌────────┐   ┌─────────┐   ┌────────────┐  │
//!   /api/<endpoint>/...  ─┼─▶│  http  │──▶│ routing │──▶│  gateway   │──┼──▶ Diagnostics API
//!                         │  │ server │   │allow-list│  │ upstream   │  │    <API_URL>/api/...
//!                         │  └────────┘   └─────────┘   └─────┬──────┘  │    X-API-Key: <API_KEY>
//!                         │       ▲                           │         │
//!   status + body  ◀──────┼───────┴───────── response ◀────────┘         │
//!                         │                                              │
//!                         │  config (TOML + env, hot reload) · logging   │
//!                         │  metrics · lifecycle (signals, shutdown)     │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use saif_gateway::config::{load_config, override_bind_address, ConfigError, GatewayConfig};
use saif_gateway::lifecycle::startup;
use saif_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "saif-gateway", version)]
#[command(about = "Diagnostic gateway between the SAIF dashboard and its API", long_about = None)]
struct Args {
    /// TOML configuration file (watched for changes)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match effective_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("saif-gateway: {}", e);
            std::process::exit(2);
        }
    };

    if args.check {
        println!("configuration OK ({} endpoints, {} mounts)", config.endpoints.allow.len(), config.mounts.len());
        return Ok(());
    }

    logging::init_logging(&config.observability);
    tracing::info!("saif-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config, args.config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// File and environment, then command-line overrides, validated as a whole.
fn effective_config(args: &Args) -> Result<GatewayConfig, ConfigError> {
    let config = load_config(args.config.as_deref())?;
    match &args.bind {
        Some(bind) => override_bind_address(config, bind),
        None => Ok(config),
    }
}
