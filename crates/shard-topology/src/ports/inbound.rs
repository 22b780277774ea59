//! # Inbound Ports
//!
//! API trait defining what the topology subsystem offers its hosts.

use crate::domain::{Action, TopologyError, TopologyNode};
use async_trait::async_trait;
use std::sync::Arc;

/// Topology API - inbound port.
#[async_trait]
pub trait TopologyApi: Send + Sync {
    /// Enqueue an action for the single ingress consumer.
    async fn submit(&self, action: Action) -> Result<(), TopologyError>;

    /// Latest published snapshot.
    fn snapshot(&self) -> Arc<TopologyNode>;

    /// Latest snapshot encoded as a snapshot document.
    fn render_snapshot(&self) -> String;
}
