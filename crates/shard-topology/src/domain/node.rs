//! # Topology Nodes
//!
//! The owned, back-pointer free node type that makes up the topology tree.
//! Parent links are implicit: lookups always traverse top-down.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the single root node.
pub const ROOT_NAME: &str = "cluster";

/// Level of a node in the fixed-depth tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The root. Rendered as `cluster` on the wire.
    #[serde(rename = "cluster")]
    Root,
    /// A cluster member hosting shards.
    Member,
    /// A partition hosted by a member.
    Shard,
    /// A unit of work running inside a shard.
    Entity,
}

impl NodeKind {
    /// The kind every child of this kind must have, `None` for leaves.
    #[must_use]
    pub const fn child_kind(self) -> Option<NodeKind> {
        match self {
            NodeKind::Root => Some(NodeKind::Member),
            NodeKind::Member => Some(NodeKind::Shard),
            NodeKind::Shard => Some(NodeKind::Entity),
            NodeKind::Entity => None,
        }
    }

    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::Root => "cluster",
            NodeKind::Member => "member",
            NodeKind::Shard => "shard",
            NodeKind::Entity => "entity",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the topology tree.
///
/// Serializes to the snapshot document shape
/// `{ "name": .., "type": .., "children": [..] }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyNode {
    /// Identifier of the member, shard or entity (`cluster` for the root).
    pub name: String,
    /// Level of the node.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Ordered children, in insertion order.
    #[serde(default)]
    pub children: Vec<TopologyNode>,
}

impl TopologyNode {
    /// Create a childless node.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    /// Create an empty root node.
    #[must_use]
    pub fn root() -> Self {
        Self::new(ROOT_NAME, NodeKind::Root)
    }

    /// Direct child with the given key.
    #[must_use]
    pub fn child(&self, name: &str, kind: NodeKind) -> Option<&TopologyNode> {
        self.children
            .iter()
            .find(|c| c.kind == kind && c.name == name)
    }

    /// Index of the direct child with the given key.
    pub(crate) fn position(&self, name: &str, kind: NodeKind) -> Option<usize> {
        self.children
            .iter()
            .position(|c| c.kind == kind && c.name == name)
    }

    /// Direct child with the given key, appended if absent.
    pub(crate) fn child_or_insert(&mut self, name: &str, kind: NodeKind) -> &mut TopologyNode {
        let index = match self.position(name, kind) {
            Some(index) => index,
            None => {
                self.children.push(TopologyNode::new(name, kind));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    /// True when the node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl fmt::Display for TopologyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.name)
    }
}
