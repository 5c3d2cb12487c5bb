//! Bridge Runtime binary.

use anyhow::{Context, Result};
use bridge_runtime::{Args, LoggingCallbacks};
use bridge_telemetry::{init_telemetry, TelemetryConfig};
use clap::Parser;
use std::sync::Arc;
use tb_01_token_connector::{LoopExit, TokenConnector};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging and metrics
    let telemetry = TelemetryConfig::for_subsystem("01", "token-connector");
    init_telemetry(&telemetry).context("failed to initialize telemetry")?;

    let config = args.connector_config();
    let callbacks = Arc::new(LoggingCallbacks::new());
    let connector = TokenConnector::init(args.name.clone(), &config, callbacks.clone())
        .context("invalid connector configuration")?;
    connector
        .start()
        .await
        .context("failed to open the event channel")?;

    info!(connector = %args.name, "Connector is running. Press Ctrl+C to stop.");

    let exit = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            connector.shutdown();
            connector.join().await
        }
        exit = connector.join() => exit,
    };

    let counts = callbacks.counts();
    info!(
        updates = counts.updates,
        pools = counts.pools,
        transfers = counts.transfers,
        approvals = counts.approvals,
        "Connector stopped"
    );

    match exit {
        Some(Ok(LoopExit::Cancelled)) | None => Ok(()),
        Some(Ok(LoopExit::ChannelClosed)) => {
            error!(connector = %args.name, "Event channel closed by the remote side");
            anyhow::bail!("event channel closed")
        }
        Some(Err(e)) => {
            error!(connector = %args.name, error = %e, "Event loop failed");
            Err(e).context("event loop failed")
        }
    }
}
