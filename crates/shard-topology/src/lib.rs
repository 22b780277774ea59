//! # Shard Topology
//!
//! Live, replicated view of which entities run in which shard of which
//! cluster member.
//!
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! ## Purpose
//!
//! Every node keeps its own copy of a fixed-depth tree
//! (`cluster → member → shard → entity`), mutates it from entity lifecycle
//! actions, fans locally originated actions out to the other live members and
//! renders point-in-time snapshots for observers.
//!
//! ```text
//!            ┌───────────────┐   forward=true   ┌───────────────────┐
//! action ──► │ EventIngress  │ ───────────────► │ ActionBroadcaster │ ──► other members
//!            │ (one writer)  │                  └───────────────────┘     (forward=false)
//!            └──────┬────────┘
//!                   │ Arc<TopologyNode>
//!                   ▼
//!          ┌──────────────────┐
//!          │ SnapshotPublisher│ ──► observers
//!          └──────────────────┘
//! ```
//!
//! The mirror is best-effort: deliveries are not retried or acknowledged and
//! replicas are never reconciled.
//!
//! ## Module Structure
//!
//! ```text
//! shard-topology/
//! ├── domain/      # TopologyTree, TopologyNode, Action, invariants, errors, config
//! ├── ports/       # TopologyApi, MembershipView, ActionTransport
//! ├── service/     # EventIngress, ActionBroadcaster, SnapshotPublisher
//! └── adapters/    # StaticMembership, LoopbackTransport
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{LoopbackTransport, StaticMembership};
pub use domain::{
    check_all_invariants, invariant_fixed_depth, invariant_no_empty_intermediates,
    invariant_unique_children, invariant_unique_entities, Action, ActionKind,
    InvariantViolation, NodeKind, Placement, TopologyConfig, TopologyError, TopologyNode,
    TopologyTree, DEFAULT_QUEUE_CAPACITY, ROOT_NAME,
};
pub use ports::{ActionTransport, LiveMember, MembershipView, TopologyApi};
pub use service::{
    decode_snapshot, error_document, render_document, ActionBroadcaster, BroadcastReport,
    EventIngress, IngressHandle, SnapshotPublisher, TopologyHandle, TopologyService,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
