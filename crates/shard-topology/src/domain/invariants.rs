//! # Domain Invariants
//!
//! Structural rules every published topology must satisfy.

use super::node::{NodeKind, TopologyNode};
use std::collections::HashSet;
use thiserror::Error;

/// A broken structural rule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    /// An entity identifier appears more than once.
    #[error("Entity {0} hosted in more than one place")]
    DuplicateEntity(String),

    /// A member or shard without children.
    #[error("Empty {kind} node: {name}")]
    EmptyIntermediate {
        /// Kind of the empty node
        kind: NodeKind,
        /// Name of the empty node
        name: String,
    },

    /// Two siblings share a `(name, kind)` key.
    #[error("Duplicate child {kind}[{name}] under {parent}")]
    DuplicateChild {
        /// Parent node name
        parent: String,
        /// Child kind
        kind: NodeKind,
        /// Child name
        name: String,
    },

    /// A child whose kind is not the one below its parent.
    #[error("{child} may not be a child of {parent}")]
    WrongDepth {
        /// Parent kind
        parent: NodeKind,
        /// Child kind
        child: NodeKind,
    },
}

/// Invariant: an entity identifier is hosted at most once.
pub fn invariant_unique_entities(root: &TopologyNode) -> Result<(), InvariantViolation> {
    let mut seen = HashSet::new();
    for member in &root.children {
        for shard in &member.children {
            for entity in &shard.children {
                if !seen.insert(entity.name.as_str()) {
                    return Err(InvariantViolation::DuplicateEntity(entity.name.clone()));
                }
            }
        }
    }
    Ok(())
}

/// Invariant: members and shards never persist without children.
pub fn invariant_no_empty_intermediates(root: &TopologyNode) -> Result<(), InvariantViolation> {
    for member in &root.children {
        if member.children.is_empty() {
            return Err(InvariantViolation::EmptyIntermediate {
                kind: member.kind,
                name: member.name.clone(),
            });
        }
        if let Some(shard) = member.children.iter().find(|s| s.children.is_empty()) {
            return Err(InvariantViolation::EmptyIntermediate {
                kind: shard.kind,
                name: shard.name.clone(),
            });
        }
    }
    Ok(())
}

/// Invariant: siblings have distinct `(name, kind)` keys.
pub fn invariant_unique_children(node: &TopologyNode) -> Result<(), InvariantViolation> {
    let mut keys = HashSet::new();
    for child in &node.children {
        if !keys.insert((child.name.as_str(), child.kind)) {
            return Err(InvariantViolation::DuplicateChild {
                parent: node.name.clone(),
                kind: child.kind,
                name: child.name.clone(),
            });
        }
        invariant_unique_children(child)?;
    }
    Ok(())
}

/// Invariant: every child sits exactly one level below its parent.
pub fn invariant_fixed_depth(node: &TopologyNode) -> Result<(), InvariantViolation> {
    for child in &node.children {
        if node.kind.child_kind() != Some(child.kind) {
            return Err(InvariantViolation::WrongDepth {
                parent: node.kind,
                child: child.kind,
            });
        }
        invariant_fixed_depth(child)?;
    }
    Ok(())
}

/// Check all invariants against a root node.
pub fn check_all_invariants(root: &TopologyNode) -> Result<(), InvariantViolation> {
    invariant_fixed_depth(root)?;
    invariant_unique_children(root)?;
    invariant_no_empty_intermediates(root)?;
    invariant_unique_entities(root)
}
