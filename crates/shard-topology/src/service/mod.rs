//! # Topology Service
//!
//! Wires the ingress consumer, the broadcaster and the snapshot publisher of
//! one node together.
//!
//! ## Concurrency
//!
//! One spawned task owns the tree. Everything else talks to it through the
//! [`IngressHandle`] queue or reads the immutable versions it publishes.

pub mod broadcaster;
pub mod ingress;
pub mod snapshot;

pub use broadcaster::{ActionBroadcaster, BroadcastReport};
pub use ingress::{EventIngress, IngressHandle};
pub use snapshot::{decode_snapshot, error_document, render_document, SnapshotPublisher};

use crate::domain::{Action, TopologyConfig, TopologyError, TopologyNode};
use crate::ports::{ActionTransport, MembershipView, TopologyApi};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Entry point for running a node's topology core.
pub struct TopologyService;

impl TopologyService {
    /// Spawn the ingress consumer on the current tokio runtime.
    ///
    /// The consumer stops when [`TopologyHandle::shutdown`] is called or when
    /// every `TopologyHandle` clone has been dropped.
    pub fn spawn<M, T>(
        config: &TopologyConfig,
        membership: Arc<M>,
        transport: Arc<T>,
    ) -> (TopologyHandle, JoinHandle<()>)
    where
        M: MembershipView + 'static,
        T: ActionTransport + 'static,
    {
        let me = membership.self_member();
        let broadcaster = ActionBroadcaster::new(membership, transport);
        let (versions_tx, versions_rx) = watch::channel(Arc::new(TopologyNode::root()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let (ingress, handle) =
            EventIngress::new(config.queue_capacity, versions_tx, broadcaster, shutdown_rx);
        let task = tokio::spawn(ingress.run());

        info!(member = %me, capacity = config.queue_capacity, "Topology service spawned");

        let handle = TopologyHandle {
            ingress: handle,
            publisher: SnapshotPublisher::new(versions_rx, config.pretty_snapshots),
            shutdown: Arc::new(shutdown_tx),
        };
        (handle, task)
    }
}

/// Cloneable handle to a running topology core.
#[derive(Clone, Debug)]
pub struct TopologyHandle {
    ingress: IngressHandle,
    publisher: SnapshotPublisher,
    shutdown: Arc<watch::Sender<bool>>,
}

impl TopologyHandle {
    /// Queue handle, for transports delivering peer actions.
    #[must_use]
    pub fn ingress(&self) -> IngressHandle {
        self.ingress.clone()
    }

    /// A publisher observing the same versions.
    #[must_use]
    pub fn publisher(&self) -> SnapshotPublisher {
        self.publisher.clone()
    }

    /// Ask the consumer to stop after the action it is applying.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

#[async_trait]
impl TopologyApi for TopologyHandle {
    async fn submit(&self, action: Action) -> Result<(), TopologyError> {
        action.validate()?;
        self.ingress.submit(action).await
    }

    fn snapshot(&self) -> Arc<TopologyNode> {
        self.publisher.current()
    }

    fn render_snapshot(&self) -> String {
        self.publisher.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{LoopbackTransport, StaticMembership};
    use crate::ports::LiveMember;
    use std::time::Duration;

    fn spawn_node() -> (TopologyHandle, JoinHandle<()>) {
        let config = TopologyConfig {
            pretty_snapshots: false,
            ..Default::default()
        };
        TopologyService::spawn(
            &config,
            Arc::new(StaticMembership::new(LiveMember::new("n1", "n1"), vec![])),
            Arc::new(LoopbackTransport::new()),
        )
    }

    #[tokio::test]
    async fn test_concrete_scenario_through_service() {
        let (topology, _task) = spawn_node();
        let mut publisher = topology.publisher();

        topology.submit(Action::start("n1", "s0", "e42")).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), publisher.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            topology.render_snapshot(),
            r#"{"name":"cluster","type":"cluster","children":[{"name":"n1","type":"member","children":[{"name":"s0","type":"shard","children":[{"name":"e42","type":"entity","children":[]}]}]}]}"#
        );

        topology.submit(Action::stop("n1", "s0", "e42")).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), publisher.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            topology.render_snapshot(),
            r#"{"name":"cluster","type":"cluster","children":[]}"#
        );
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_action() {
        let (topology, _task) = spawn_node();
        let err = topology.submit(Action::start("", "s", "e")).await.unwrap_err();
        assert!(matches!(err, TopologyError::Decode(_)));
    }

    #[tokio::test]
    async fn test_shutdown_stops_consumer() {
        let (topology, task) = spawn_node();
        topology.shutdown();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert!(topology.ingress().is_closed());
    }

    #[tokio::test]
    async fn test_initial_snapshot_is_empty_cluster() {
        let (topology, _task) = spawn_node();
        let root = topology.snapshot();
        assert_eq!(root.name, "cluster");
        assert!(root.children.is_empty());
    }
}
