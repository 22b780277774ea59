//! # Topology Tree
//!
//! The three-level member → shard → entity tree and its mutation algorithms.
//!
//! ## Invariants
//!
//! - An entity identifier appears at most once in the whole tree.
//! - Shards and members never persist without children.
//! - Children of a node have distinct `(name, kind)` keys.
//!
//! Mutations cannot fail: removing a path that does not exist is a no-op.

use super::node::{NodeKind, TopologyNode};

/// Result of [`TopologyTree::add_entity`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    /// The entity was not present anywhere and has been inserted.
    Inserted,
    /// The entity was already at the requested location.
    Unchanged,
    /// The entity was moved away from another location.
    Relocated {
        /// Member the entity was previously hosted on.
        member: String,
        /// Shard the entity was previously hosted in.
        shard: String,
    },
}

/// The live topology of one node's view of the cluster.
///
/// Owns every [`TopologyNode`]; only clones leave through [`Self::snapshot`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopologyTree {
    root: TopologyNode,
}

impl TopologyTree {
    /// Create an empty tree holding only the `cluster` root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: TopologyNode::root(),
        }
    }

    /// Place `entity` under `member/shard`.
    ///
    /// Every other occurrence of `entity` is removed before insertion, so a
    /// relocated entity is never visible in two places.
    pub fn add_entity(&mut self, member: &str, shard: &str, entity: &str) -> Placement {
        let previous = self.locate(entity);
        self.evict_entity(entity, member, shard);

        let member_node = self.root.child_or_insert(member, NodeKind::Member);
        let shard_node = member_node.child_or_insert(shard, NodeKind::Shard);
        shard_node.child_or_insert(entity, NodeKind::Entity);

        match previous {
            None => Placement::Inserted,
            Some((m, s)) if m == member && s == shard => Placement::Unchanged,
            Some((m, s)) => Placement::Relocated {
                member: m,
                shard: s,
            },
        }
    }

    /// Remove `entity` from `member/shard`, pruning the shard and member if
    /// they become empty.
    ///
    /// Returns `false` when the path does not exist.
    pub fn remove_entity(&mut self, member: &str, shard: &str, entity: &str) -> bool {
        let Some(m) = self.root.position(member, NodeKind::Member) else {
            return false;
        };
        let member_node = &mut self.root.children[m];
        let Some(s) = member_node.position(shard, NodeKind::Shard) else {
            return false;
        };
        let shard_node = &mut member_node.children[s];
        let Some(e) = shard_node.position(entity, NodeKind::Entity) else {
            return false;
        };

        shard_node.children.remove(e);
        if shard_node.children.is_empty() {
            member_node.children.remove(s);
        }
        if member_node.children.is_empty() {
            self.root.children.remove(m);
        }
        true
    }

    /// Exact-path lookup of an entity node.
    #[must_use]
    pub fn find(&self, member: &str, shard: &str, entity: &str) -> Option<&TopologyNode> {
        self.root
            .child(member, NodeKind::Member)?
            .child(shard, NodeKind::Shard)?
            .child(entity, NodeKind::Entity)
    }

    /// Member and shard currently hosting `entity`.
    #[must_use]
    pub fn locate(&self, entity: &str) -> Option<(String, String)> {
        self.root.children.iter().find_map(|member| {
            member
                .children
                .iter()
                .find(|shard| shard.child(entity, NodeKind::Entity).is_some())
                .map(|shard| (member.name.clone(), shard.name.clone()))
        })
    }

    /// Deep copy of the whole tree.
    #[must_use]
    pub fn snapshot(&self) -> TopologyNode {
        self.root.clone()
    }

    /// Borrow the root node.
    #[must_use]
    pub fn root(&self) -> &TopologyNode {
        &self.root
    }

    /// Number of members with at least one shard.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.root.children.len()
    }

    /// Number of entities across all members and shards.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.root
            .children
            .iter()
            .flat_map(|member| member.children.iter())
            .map(|shard| shard.children.len())
            .sum()
    }

    /// True when the root has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Remove every occurrence of `entity` outside `keep_member/keep_shard`.
    ///
    /// Only shards and members that lost an entity here are pruned.
    fn evict_entity(&mut self, entity: &str, keep_member: &str, keep_shard: &str) -> usize {
        let mut evicted = 0;

        self.root.children.retain_mut(|member| {
            let in_kept_member = member.name == keep_member;
            let mut touched = false;

            member.children.retain_mut(|shard| {
                if in_kept_member && shard.name == keep_shard {
                    return true;
                }
                let before = shard.children.len();
                shard
                    .children
                    .retain(|e| !(e.kind == NodeKind::Entity && e.name == entity));
                let removed = before - shard.children.len();
                if removed == 0 {
                    return true;
                }
                evicted += removed;
                touched = true;
                !shard.children.is_empty()
            });

            !(touched && member.children.is_empty())
        });

        evicted
    }
}

impl Default for TopologyTree {
    fn default() -> Self {
        Self::new()
    }
}
