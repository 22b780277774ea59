//! # Node Configuration
//!
//! Unified configuration for one monitor node.
//!
//! All values have development defaults and can be overridden through `SM_*`
//! environment variables (see [`NodeConfig::from_env`]).

use shard_topology::{LiveMember, TopologyConfig, TopologyError};
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A peer entry is not of the form `id@host:port`.
    #[error("Invalid peer spec: {0}")]
    InvalidPeer(String),

    /// Two peers share an id.
    #[error("Duplicate peer id: {0}")]
    DuplicatePeer(String),

    /// HTTP and peer listeners would share a port.
    #[error("HTTP and peer listeners both configured on port {0}")]
    PortConflict(u16),

    /// A numeric variable could not be parsed.
    #[error("{var} is not a valid number: {value}")]
    InvalidNumber {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// The topology core rejected its part of the environment.
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Directory of the monitor pages shipped with this crate.
pub const DEFAULT_ASSET_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets");

/// Default upper bound on one peer line, in bytes.
pub const DEFAULT_PEER_MAX_LINE_BYTES: usize = 64 * 1024;

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Member id of this node. Defaults to the resolved host name.
    pub node_id: Option<String>,
    /// Host other members use to reach this node. Defaults to the host name.
    pub advertised_host: Option<String>,
    /// Interface the observer gateway binds to.
    pub http_host: String,
    /// Observer gateway port (0 picks an ephemeral port).
    pub http_port: u16,
    /// Interface the peer listener binds to.
    pub peer_host: String,
    /// Peer listener port (0 picks an ephemeral port).
    pub peer_port: u16,
    /// Other members, as `id@host:port`.
    pub peers: Vec<LiveMember>,
    /// Directory holding monitor pages and scripts.
    pub asset_dir: PathBuf,
    /// Upper bound on one peer delivery attempt.
    pub delivery_timeout_ms: u64,
    /// Inbound peer connections silent for this long are closed.
    pub peer_idle_timeout_ms: u64,
    /// Longest accepted inbound peer line, newline excluded.
    pub peer_max_line_bytes: usize,
    /// Topology core configuration.
    pub topology: TopologyConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            advertised_host: None,
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            peer_host: "0.0.0.0".to_string(),
            peer_port: 2552,
            peers: Vec::new(),
            asset_dir: PathBuf::from(DEFAULT_ASSET_DIR),
            delivery_timeout_ms: 2_000,
            peer_idle_timeout_ms: 30_000,
            peer_max_line_bytes: DEFAULT_PEER_MAX_LINE_BYTES,
            topology: TopologyConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Create configuration from environment variables.
    ///
    /// - `SM_NODE_ID`: member id (default: host name)
    /// - `SM_ADVERTISED_HOST`: host announced to peers (default: host name)
    /// - `SM_HTTP_HOST` / `SM_HTTP_PORT`: gateway bind (default: 0.0.0.0:8080)
    /// - `SM_PEER_HOST` / `SM_PEER_PORT`: peer listener bind (default: 0.0.0.0:2552)
    /// - `SM_PEERS`: comma separated `id@host:port` list
    /// - `SM_ASSET_DIR`: static asset directory (default: this crate's `assets/`)
    /// - `SM_DELIVERY_TIMEOUT_MS`: per-delivery bound (default: 2000)
    /// - `SM_PEER_IDLE_TIMEOUT_MS`: idle inbound peer connection bound (default: 30000)
    /// - `SM_PEER_MAX_LINE_BYTES`: longest inbound peer line (default: 65536)
    /// - `SM_QUEUE_CAPACITY`, `SM_PRETTY_SNAPSHOTS`: see [`TopologyConfig::from_env`]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Same as [`Self::from_env`], reading variables through `var`.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            node_id: non_empty_var(&var, "SM_NODE_ID"),
            advertised_host: non_empty_var(&var, "SM_ADVERTISED_HOST"),
            http_host: var("SM_HTTP_HOST").unwrap_or(defaults.http_host),
            http_port: number_var(&var, "SM_HTTP_PORT", defaults.http_port)?,
            peer_host: var("SM_PEER_HOST").unwrap_or(defaults.peer_host),
            peer_port: number_var(&var, "SM_PEER_PORT", defaults.peer_port)?,
            peers: match var("SM_PEERS") {
                Some(list) => parse_peers(&list)?,
                None => defaults.peers,
            },
            asset_dir: var("SM_ASSET_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.asset_dir),
            delivery_timeout_ms: number_var(
                &var,
                "SM_DELIVERY_TIMEOUT_MS",
                defaults.delivery_timeout_ms,
            )?,
            peer_idle_timeout_ms: number_var(
                &var,
                "SM_PEER_IDLE_TIMEOUT_MS",
                defaults.peer_idle_timeout_ms,
            )?,
            peer_max_line_bytes: number_var(
                &var,
                "SM_PEER_MAX_LINE_BYTES",
                defaults.peer_max_line_bytes,
            )?,
            topology: TopologyConfig::from_vars(&var)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for conflicts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http_port != 0 && self.http_port == self.peer_port {
            return Err(ConfigError::PortConflict(self.http_port));
        }

        let mut ids = HashSet::new();
        for peer in &self.peers {
            if !ids.insert(peer.id.as_str()) {
                return Err(ConfigError::DuplicatePeer(peer.id.clone()));
            }
        }
        Ok(())
    }

    /// Gateway bind address.
    #[must_use]
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Peer listener bind address.
    #[must_use]
    pub fn peer_bind_addr(&self) -> String {
        format!("{}:{}", self.peer_host, self.peer_port)
    }

    /// Per-delivery timeout.
    #[must_use]
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    /// Idle bound for inbound peer connections.
    #[must_use]
    pub fn peer_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_idle_timeout_ms)
    }
}

/// Parse a comma separated `id@host:port` list. Blank entries are skipped.
pub fn parse_peers(list: &str) -> Result<Vec<LiveMember>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse::<LiveMember>()
                .map_err(|_| ConfigError::InvalidPeer(entry.to_string()))
        })
        .collect()
}

fn non_empty_var<F>(var: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    var(name).filter(|v| !v.trim().is_empty())
}

fn number_var<F, N>(var: &F, name: &'static str, default: N) -> Result<N, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    N: std::str::FromStr,
{
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var: name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.peer_port, 2552);
        assert_eq!(config.delivery_timeout(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_peers() {
        let peers = parse_peers(" n2@10.0.0.2:2552, ,n3@10.0.0.3:2552 ").unwrap();
        assert_eq!(
            peers,
            vec![
                LiveMember::new("n2", "10.0.0.2:2552"),
                LiveMember::new("n3", "10.0.0.3:2552")
            ]
        );
    }

    #[test]
    fn test_parse_peers_rejects_bad_entry() {
        assert_eq!(
            parse_peers("n2@h:1,oops"),
            Err(ConfigError::InvalidPeer("oops".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_duplicate_peer() {
        let config = NodeConfig {
            peers: parse_peers("n2@a:1,n2@b:1").unwrap(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicatePeer("n2".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_shared_port() {
        let config = NodeConfig {
            http_port: 9000,
            peer_port: 9000,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::PortConflict(9000)));
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_from_vars_reads_every_layer() {
        let config = NodeConfig::from_vars(vars(&[
            ("SM_NODE_ID", "n1"),
            ("SM_PEERS", "n2@10.0.0.2:2552"),
            ("SM_PEER_IDLE_TIMEOUT_MS", "500"),
            ("SM_PEER_MAX_LINE_BYTES", "128"),
            ("SM_QUEUE_CAPACITY", "8"),
        ]))
        .unwrap();
        assert_eq!(config.node_id.as_deref(), Some("n1"));
        assert_eq!(config.peers.len(), 1);
        assert_eq!(config.peer_idle_timeout(), Duration::from_millis(500));
        assert_eq!(config.peer_max_line_bytes, 128);
        assert_eq!(config.topology.queue_capacity, 8);
    }

    #[test]
    fn test_malformed_numbers_rejected_in_every_layer() {
        assert_eq!(
            NodeConfig::from_vars(vars(&[("SM_HTTP_PORT", "eighty")])).unwrap_err(),
            ConfigError::InvalidNumber {
                var: "SM_HTTP_PORT",
                value: "eighty".to_string()
            }
        );
        assert!(matches!(
            NodeConfig::from_vars(vars(&[("SM_QUEUE_CAPACITY", "lots")])).unwrap_err(),
            ConfigError::Topology(TopologyError::Config(_))
        ));
    }

    #[test]
    fn test_default_asset_dir_ships_every_page() {
        let dir = NodeConfig::default().asset_dir;
        for page in ["monitor.html", "monitor2.html", "monitor3.html"] {
            assert!(dir.join(page).is_file(), "{page} missing from {}", dir.display());
        }
    }

    #[test]
    fn test_ephemeral_ports_do_not_conflict() {
        let config = NodeConfig {
            http_port: 0,
            peer_port: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
