//! # Monitor Node
//!
//! Entry point for one member of a shard-monitor deployment.
//!
//! Configuration comes from `SM_*` environment variables (see
//! [`NodeConfig::from_env`]). The node runs until Ctrl+C.
//!
//! Pages are read from `SM_ASSET_DIR`, which defaults to this crate's
//! `assets/` directory and holds `monitor.html`, `monitor2.html` and
//! `monitor3.html`. Scripts requested under `/d3/` are read from
//! `$SM_ASSET_DIR/d3/` and are not shipped; until they are supplied those
//! requests answer 503.

use anyhow::{Context, Result};
use monitor_node::{MonitorNode, NodeConfig, NodeError};
use shard_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("Failed to load node configuration")?;

    let telemetry = match &config.node_id {
        Some(id) => TelemetryConfig::for_node(id),
        None => TelemetryConfig::from_env(),
    };
    let _guard = init_telemetry(telemetry)
        .map_err(NodeError::from)
        .context("Failed to initialize telemetry")?;

    let node = match MonitorNode::start(config).await {
        Ok(node) => node,
        Err(e) => {
            error!(error = %e, "Monitor node failed to start");
            return Err(e).context("Failed to start monitor node");
        }
    };

    info!(
        member = %node.member(),
        http = %node.http_addr(),
        "Node is running. Press Ctrl+C to stop."
    );
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    node.shutdown().await;
    Ok(())
}
