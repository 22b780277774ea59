//! # In-Process Cluster Flows
//!
//! Several topology cores wired together through one [`LoopbackTransport`].
//! Each core sees every other member as live unless told otherwise.
//!
//! ## Flows Tested:
//!
//! 1. **Convergence**: locally reported events reach every replica
//! 2. **Relocation**: an entity reported elsewhere moves on every replica
//! 3. **Loop prevention**: non-forwarded actions stay local
//! 4. **Lost delivery**: a severed link leaves replicas diverged for good
//! 5. **Down members**: members outside the live set are skipped

use shard_topology::{
    LiveMember, LoopbackTransport, StaticMembership, TopologyConfig, TopologyHandle,
    TopologyNode, TopologyService,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One member of a [`LoopbackCluster`].
pub struct ClusterNode {
    /// Membership entry of this node
    pub member: LiveMember,
    /// Live-member view used by this node's broadcaster
    pub membership: Arc<StaticMembership>,
    /// Handle to this node's core
    pub topology: TopologyHandle,
}

/// Fully meshed cluster over a shared loopback transport.
pub struct LoopbackCluster {
    /// Transport shared by every node
    pub transport: Arc<LoopbackTransport>,
    /// Nodes in spawn order
    pub nodes: Vec<ClusterNode>,
}

impl LoopbackCluster {
    /// Spawn one core per id. Addresses are `loop://<id>`.
    pub fn spawn(ids: &[&str]) -> Self {
        let transport = Arc::new(LoopbackTransport::new());
        let members: Vec<LiveMember> = ids
            .iter()
            .map(|id| LiveMember::new(*id, format!("loop://{id}")))
            .collect();
        let config = TopologyConfig {
            pretty_snapshots: false,
            ..Default::default()
        };

        let nodes = members
            .iter()
            .map(|me| {
                let membership = Arc::new(StaticMembership::new(me.clone(), members.clone()));
                let (topology, _task) =
                    TopologyService::spawn(&config, Arc::clone(&membership), Arc::clone(&transport));
                transport.register(me.address.clone(), topology.ingress());
                ClusterNode {
                    member: me.clone(),
                    membership,
                    topology,
                }
            })
            .collect();

        Self { transport, nodes }
    }

    /// Node by member id.
    ///
    /// # Panics
    ///
    /// Panics if no node has that id.
    pub fn node(&self, id: &str) -> &ClusterNode {
        self.nodes
            .iter()
            .find(|n| n.member.id == id)
            .unwrap_or_else(|| panic!("no node {id}"))
    }
}

/// `(member, shard, entity)` triples held by a snapshot, order-free.
pub fn placements(root: &TopologyNode) -> BTreeSet<(String, String, String)> {
    let mut out = BTreeSet::new();
    for member in &root.children {
        for shard in &member.children {
            for entity in &shard.children {
                out.insert((member.name.clone(), shard.name.clone(), entity.name.clone()));
            }
        }
    }
    out
}

/// Wait until `check` holds for the node's latest version, or `within` runs out.
pub async fn wait_until<F>(topology: &TopologyHandle, check: F, within: Duration) -> bool
where
    F: Fn(&TopologyNode) -> bool,
{
    let deadline = Instant::now() + within;
    let mut publisher = topology.publisher();
    loop {
        if check(publisher.current().as_ref()) {
            return true;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, publisher.changed()).await {
            Ok(Ok(_)) => {}
            Ok(Err(_)) | Err(_) => return check(publisher.current().as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shard_topology::{check_all_invariants, Action, TopologyApi};

    const SETTLE: Duration = Duration::from_secs(2);
    const QUIET: Duration = Duration::from_millis(200);

    fn triple(member: &str, shard: &str, entity: &str) -> (String, String, String) {
        (member.to_string(), shard.to_string(), entity.to_string())
    }

    // =========================================================================
    // CONVERGENCE
    // =========================================================================

    #[tokio::test]
    async fn test_three_nodes_converge() {
        let cluster = LoopbackCluster::spawn(&["n1", "n2", "n3"]);

        cluster
            .node("n1")
            .topology
            .submit(Action::start("n1", "s0", "e1"))
            .await
            .unwrap();
        cluster
            .node("n2")
            .topology
            .submit(Action::start("n2", "s1", "e2"))
            .await
            .unwrap();

        let expected: BTreeSet<_> =
            [triple("n1", "s0", "e1"), triple("n2", "s1", "e2")].into_iter().collect();
        for node in &cluster.nodes {
            assert!(
                wait_until(&node.topology, |root| placements(root) == expected, SETTLE).await,
                "{} did not converge",
                node.member
            );
            assert!(check_all_invariants(&node.topology.snapshot()).is_ok());
        }
    }

    #[tokio::test]
    async fn test_stop_propagates() {
        let cluster = LoopbackCluster::spawn(&["n1", "n2", "n3"]);
        let origin = &cluster.node("n1").topology;

        origin.submit(Action::start("n1", "s0", "e1")).await.unwrap();
        for node in &cluster.nodes {
            assert!(wait_until(&node.topology, |root| !root.children.is_empty(), SETTLE).await);
        }

        origin.submit(Action::stop("n1", "s0", "e1")).await.unwrap();
        for node in &cluster.nodes {
            assert!(wait_until(&node.topology, |root| root.children.is_empty(), SETTLE).await);
        }
    }

    // =========================================================================
    // RELOCATION
    // =========================================================================

    #[tokio::test]
    async fn test_relocation_reported_by_other_member() {
        let cluster = LoopbackCluster::spawn(&["n1", "n2", "n3"]);

        cluster
            .node("n1")
            .topology
            .submit(Action::start("n1", "s0", "e1"))
            .await
            .unwrap();
        for node in &cluster.nodes {
            assert!(wait_until(&node.topology, |root| placements(root).len() == 1, SETTLE).await);
        }

        cluster
            .node("n2")
            .topology
            .submit(Action::start("n2", "s3", "e1"))
            .await
            .unwrap();

        let moved: BTreeSet<_> = [triple("n2", "s3", "e1")].into_iter().collect();
        for node in &cluster.nodes {
            assert!(wait_until(&node.topology, |root| placements(root) == moved, SETTLE).await);
            // n1 lost its only entity and is pruned.
            assert_eq!(node.topology.snapshot().children.len(), 1);
        }
    }

    // =========================================================================
    // LOOP PREVENTION
    // =========================================================================

    #[tokio::test]
    async fn test_non_forwarded_action_stays_local() {
        let cluster = LoopbackCluster::spawn(&["n1", "n2", "n3"]);

        cluster
            .node("n2")
            .topology
            .ingress()
            .submit(Action::start("n1", "s0", "e1").as_no_forward())
            .await
            .unwrap();

        assert!(wait_until(&cluster.node("n2").topology, |root| !root.children.is_empty(), SETTLE).await);
        tokio::time::sleep(QUIET).await;
        assert!(cluster.node("n1").topology.snapshot().children.is_empty());
        assert!(cluster.node("n3").topology.snapshot().children.is_empty());
        assert_eq!(cluster.transport.delivered(), 0);
    }

    // =========================================================================
    // ACCEPTED LIMITATIONS
    // =========================================================================

    #[tokio::test]
    async fn test_lost_delivery_leaves_replicas_diverged() {
        let cluster = LoopbackCluster::spawn(&["n1", "n2", "n3"]);
        cluster.transport.sever("loop://n3");

        let origin = &cluster.node("n1").topology;
        origin.submit(Action::start("n1", "s0", "e9")).await.unwrap();
        assert!(wait_until(&cluster.node("n2").topology, |root| placements(root).len() == 1, SETTLE).await);
        assert!(!wait_until(&cluster.node("n3").topology, |root| !root.children.is_empty(), QUIET).await);

        // Later events flow again, the lost one is never reconciled.
        cluster.transport.heal("loop://n3");
        origin.submit(Action::start("n1", "s0", "e10")).await.unwrap();

        let n3_expected: BTreeSet<_> = [triple("n1", "s0", "e10")].into_iter().collect();
        assert!(wait_until(&cluster.node("n3").topology, |root| placements(root) == n3_expected, SETTLE).await);
        assert!(wait_until(&cluster.node("n2").topology, |root| placements(root).len() == 2, SETTLE).await);
        assert_ne!(
            placements(&cluster.node("n2").topology.snapshot()),
            placements(&cluster.node("n3").topology.snapshot())
        );
    }

    #[tokio::test]
    async fn test_down_member_is_skipped() {
        let cluster = LoopbackCluster::spawn(&["n1", "n2", "n3"]);
        let origin = cluster.node("n1");
        origin.membership.mark_down("n3");

        origin.topology.submit(Action::start("n1", "s0", "e1")).await.unwrap();
        assert!(wait_until(&cluster.node("n2").topology, |root| !root.children.is_empty(), SETTLE).await);
        assert!(!wait_until(&cluster.node("n3").topology, |root| !root.children.is_empty(), QUIET).await);
    }
}
