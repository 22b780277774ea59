//! # Event Ingress
//!
//! The single logical writer of a node's [`TopologyTree`].
//!
//! ```text
//! local report ──┐
//!                ├──► mpsc queue ──► EventIngress::run ──► TopologyTree
//! peer delivery ─┘                        │
//!                                         ├──► watch<Arc<TopologyNode>> (snapshots)
//!                                         └──► ActionBroadcaster (forward only)
//! ```
//!
//! Local and remote actions are indistinguishable once queued; only the
//! `forward` flag decides whether the consumer fans the action out.

use super::broadcaster::ActionBroadcaster;
use crate::domain::{Action, ActionKind, Placement, TopologyError, TopologyNode, TopologyTree};
use crate::ports::{ActionTransport, MembershipView};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Cloneable sending side of the ingress queue.
#[derive(Clone, Debug)]
pub struct IngressHandle {
    sender: mpsc::Sender<Action>,
}

impl IngressHandle {
    /// Enqueue an action, waiting for queue capacity.
    pub async fn submit(&self, action: Action) -> Result<(), TopologyError> {
        self.sender
            .send(action)
            .await
            .map_err(|_| TopologyError::IngressClosed)
    }

    /// Enqueue an action without waiting.
    pub fn try_submit(&self, action: Action) -> Result<(), TopologyError> {
        self.sender.try_send(action).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TopologyError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TopologyError::IngressClosed,
        })
    }

    /// True once the consumer has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Consumer task state: owns the tree exclusively.
pub struct EventIngress<M, T>
where
    M: MembershipView,
    T: ActionTransport,
{
    tree: TopologyTree,
    inbox: mpsc::Receiver<Action>,
    versions: watch::Sender<Arc<TopologyNode>>,
    broadcaster: ActionBroadcaster<M, T>,
    shutdown: watch::Receiver<bool>,
    applied: u64,
}

impl<M, T> EventIngress<M, T>
where
    M: MembershipView + 'static,
    T: ActionTransport + 'static,
{
    /// Create the consumer and its queue handle.
    ///
    /// `versions` receives a fresh immutable snapshot after every action.
    pub fn new(
        capacity: usize,
        versions: watch::Sender<Arc<TopologyNode>>,
        broadcaster: ActionBroadcaster<M, T>,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, IngressHandle) {
        let (sender, inbox) = mpsc::channel(capacity.max(1));
        let ingress = Self {
            tree: TopologyTree::new(),
            inbox,
            versions,
            broadcaster,
            shutdown,
            applied: 0,
        };
        (ingress, IngressHandle { sender })
    }

    /// Drain the queue until every handle is dropped or shutdown is signalled.
    pub async fn run(mut self) {
        info!("Event ingress started");

        loop {
            tokio::select! {
                biased;
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                next = self.inbox.recv() => match next {
                    Some(action) => self.apply(action),
                    None => break,
                },
            }
        }

        info!(
            applied = self.applied,
            members = self.tree.member_count(),
            entities = self.tree.entity_count(),
            "Event ingress stopped"
        );
    }

    /// Apply one action, publish the new version, then fan out if required.
    fn apply(&mut self, action: Action) {
        match action.kind {
            ActionKind::Start => {
                match self
                    .tree
                    .add_entity(&action.member, &action.shard, &action.entity)
                {
                    Placement::Relocated { member, shard } => {
                        debug!(%action, from_member = %member, from_shard = %shard, "Entity relocated");
                    }
                    Placement::Unchanged => debug!(%action, "Entity already placed"),
                    Placement::Inserted => debug!(%action, "Entity placed"),
                }
            }
            ActionKind::Stop => {
                if !self
                    .tree
                    .remove_entity(&action.member, &action.shard, &action.entity)
                {
                    debug!(%action, "Stop for unknown path ignored");
                }
            }
        }

        self.applied += 1;
        self.versions.send_replace(Arc::new(self.tree.snapshot()));

        if action.forward {
            let report = self.broadcaster.broadcast(&action);
            debug!(%action, targets = report.len(), "Action fanned out");
        }
    }
}
