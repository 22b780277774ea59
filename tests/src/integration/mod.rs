//! Cross-node integration flows.

pub mod cluster_flows;
pub mod node_flows;
