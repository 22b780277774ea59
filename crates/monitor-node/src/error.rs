//! Runtime error type.

use crate::config::ConfigError;
use shard_telemetry::TelemetryError;
use shard_topology::TopologyError;
use thiserror::Error;

/// Errors that stop a node from starting.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Error raised by the topology core (startup failures included).
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging could not be installed.
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// A listener could not be bound.
    #[error("Failed to bind {listener} listener on {addr}: {source}")]
    Bind {
        /// Which listener
        listener: &'static str,
        /// Requested address
        addr: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
