//! # Action Broadcaster
//!
//! Fans a locally originated action out to every other live member.
//!
//! Delivery is at-most-once per attempt: each destination gets its own
//! spawned send, failures are logged and dropped, nothing is retried and no
//! ordering holds across destinations or successive broadcasts. Replicas may
//! therefore diverge for good; there is no reconciliation pass.

use crate::domain::Action;
use crate::ports::{ActionTransport, LiveMember, MembershipView};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What a single [`ActionBroadcaster::broadcast`] call dispatched.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    /// Member ids a copy was dispatched to.
    pub targets: Vec<String>,
    deliveries: Vec<JoinHandle<()>>,
}

impl BroadcastReport {
    /// Number of destinations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True when nothing was dispatched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Wait until every dispatched send has finished, whatever its outcome.
    ///
    /// Dropping the report instead leaves the sends running detached.
    pub async fn settle(self) {
        for delivery in self.deliveries {
            let _ = delivery.await;
        }
    }
}

/// Broadcasts actions through a transport to the current live members.
pub struct ActionBroadcaster<M, T>
where
    M: MembershipView,
    T: ActionTransport,
{
    membership: Arc<M>,
    transport: Arc<T>,
}

impl<M, T> Clone for ActionBroadcaster<M, T>
where
    M: MembershipView,
    T: ActionTransport,
{
    fn clone(&self) -> Self {
        Self {
            membership: self.membership.clone(),
            transport: self.transport.clone(),
        }
    }
}

impl<M, T> ActionBroadcaster<M, T>
where
    M: MembershipView + 'static,
    T: ActionTransport + 'static,
{
    /// Create a broadcaster over the given collaborators.
    pub fn new(membership: Arc<M>, transport: Arc<T>) -> Self {
        Self {
            membership,
            transport,
        }
    }

    /// Live members other than self, in membership order.
    #[must_use]
    pub fn destinations(&self) -> Vec<LiveMember> {
        let me = self.membership.self_member();
        self.membership
            .live_members()
            .into_iter()
            .filter(|member| member.id != me.id)
            .collect()
    }

    /// Send a non-forwarding copy of `action` to every other live member.
    ///
    /// Actions that are already non-forwarding are never re-sent. Must be
    /// called from within a tokio runtime.
    pub fn broadcast(&self, action: &Action) -> BroadcastReport {
        if !action.forward {
            return BroadcastReport::default();
        }

        let copy = action.as_no_forward();
        let mut report = BroadcastReport::default();

        for member in self.destinations() {
            debug!(action = %copy, target = %member, "Forwarding action");
            let transport = self.transport.clone();
            let copy = copy.clone();
            report.targets.push(member.id.clone());
            report.deliveries.push(tokio::spawn(async move {
                if let Err(e) = transport.deliver(&member, copy).await {
                    warn!(target = %member, error = %e, "Action delivery dropped");
                }
            }));
        }

        report
    }
}
