//! # Static Membership
//!
//! A [`MembershipView`] over a configured member list. The host can push
//! liveness changes with [`StaticMembership::mark_down`] /
//! [`StaticMembership::mark_up`] or replace the list outright.

use crate::ports::{LiveMember, MembershipView};
use parking_lot::RwLock;
use std::collections::HashSet;

/// Membership view backed by a fixed list plus a set of members marked down.
#[derive(Debug)]
pub struct StaticMembership {
    me: LiveMember,
    peers: RwLock<Vec<LiveMember>>,
    down: RwLock<HashSet<String>>,
}

impl StaticMembership {
    /// Create a view of `me` plus `peers`. Peers sharing `me`'s id and
    /// repeated ids are dropped.
    pub fn new(me: LiveMember, peers: Vec<LiveMember>) -> Self {
        let view = Self {
            me,
            peers: RwLock::new(Vec::new()),
            down: RwLock::new(HashSet::new()),
        };
        view.replace_peers(peers);
        view
    }

    /// Replace the peer list.
    pub fn replace_peers(&self, peers: Vec<LiveMember>) {
        let mut seen = HashSet::new();
        seen.insert(self.me.id.clone());
        let peers = peers
            .into_iter()
            .filter(|peer| seen.insert(peer.id.clone()))
            .collect();
        *self.peers.write() = peers;
    }

    /// Exclude a member from the live set until [`Self::mark_up`].
    pub fn mark_down(&self, id: &str) {
        self.down.write().insert(id.to_string());
    }

    /// Return a member to the live set.
    pub fn mark_up(&self, id: &str) {
        self.down.write().remove(id);
    }
}

impl MembershipView for StaticMembership {
    fn self_member(&self) -> LiveMember {
        self.me.clone()
    }

    fn live_members(&self) -> Vec<LiveMember> {
        let down = self.down.read();
        std::iter::once(self.me.clone())
            .chain(self.peers.read().iter().cloned())
            .filter(|member| !down.contains(&member.id))
            .collect()
    }
}
