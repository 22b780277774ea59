//! Topology service configuration.

use super::errors::TopologyError;
use std::env;

/// Default capacity of the ingress queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Configuration for one node's topology service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyConfig {
    /// Bounded capacity of the ingress queue.
    pub queue_capacity: usize,
    /// Render snapshot documents with indentation.
    pub pretty_snapshots: bool,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            pretty_snapshots: true,
        }
    }
}

impl TopologyConfig {
    /// Create configuration from environment variables.
    ///
    /// - `SM_QUEUE_CAPACITY`: ingress queue capacity (default: 1024, minimum 1)
    /// - `SM_PRETTY_SNAPSHOTS`: indent snapshot documents (`true`/`false`/`1`/`0`, default: true)
    ///
    /// Unparseable values are rejected rather than replaced by defaults.
    pub fn from_env() -> Result<Self, TopologyError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Same as [`Self::from_env`], reading variables through `var`.
    pub fn from_vars<F>(var: F) -> Result<Self, TopologyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let queue_capacity = match var("SM_QUEUE_CAPACITY") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .map(|v| v.max(1))
                .map_err(|_| {
                    TopologyError::Config(format!("SM_QUEUE_CAPACITY is not a valid number: {value}"))
                })?,
            None => defaults.queue_capacity,
        };

        let pretty_snapshots = match var("SM_PRETTY_SNAPSHOTS") {
            Some(value) => match value.trim().to_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(TopologyError::Config(format!(
                        "SM_PRETTY_SNAPSHOTS is not a boolean: {value}"
                    )))
                }
            },
            None => defaults.pretty_snapshots,
        };

        Ok(Self {
            queue_capacity,
            pretty_snapshots,
        })
    }
}
