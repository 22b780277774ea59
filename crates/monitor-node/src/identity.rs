//! Own-identity resolution.
//!
//! A node that cannot tell who it is must not come up half-initialized:
//! failures here are [`TopologyError::Startup`].

use crate::config::NodeConfig;
use shard_topology::{LiveMember, TopologyError};

/// Resolved identity of this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    /// Member id used in actions and membership.
    pub id: String,
    /// Host announced to other members.
    pub advertised_host: String,
}

impl NodeIdentity {
    /// Membership entry for this node once its peer port is known.
    #[must_use]
    pub fn member(&self, peer_port: u16) -> LiveMember {
        LiveMember::new(
            self.id.clone(),
            format!("{}:{}", self.advertised_host, peer_port),
        )
    }
}

/// Resolve the node id and advertised host, falling back to the host name.
pub fn resolve(config: &NodeConfig) -> Result<NodeIdentity, TopologyError> {
    let advertised_host = match &config.advertised_host {
        Some(host) => host.clone(),
        None => local_hostname()?,
    };
    let id = match &config.node_id {
        Some(id) => id.clone(),
        None => advertised_host.clone(),
    };
    Ok(NodeIdentity {
        id,
        advertised_host,
    })
}

fn local_hostname() -> Result<String, TopologyError> {
    let name = hostname::get()
        .map_err(|e| TopologyError::Startup(format!("unable to resolve hostname: {e}")))?;
    let name = name
        .into_string()
        .map_err(|_| TopologyError::Startup("hostname is not valid UTF-8".to_string()))?;
    if name.is_empty() {
        return Err(TopologyError::Startup("hostname is empty".to_string()));
    }
    Ok(name)
}
