//! # Domain Errors
//!
//! Error types for the topology subsystem.
//!
//! A lookup miss is not an error: removals and lookups on missing paths
//! return `false` / `None`.

use thiserror::Error;

/// Topology error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// The node could not come up (e.g. own identity unresolvable).
    #[error("Startup failure: {0}")]
    Startup(String),

    /// A static asset could not be served.
    #[error("Asset unavailable: {0}")]
    AssetUnavailable(String),

    /// A document could not be encoded.
    #[error("Serialization failure: {0}")]
    Serialization(String),

    /// An observer sent input the protocol does not allow.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// An action or snapshot document could not be decoded.
    #[error("Malformed document: {0}")]
    Decode(String),

    /// A copy of an action could not be handed to a member.
    #[error("Delivery to {member} failed: {reason}")]
    Delivery {
        /// Target member id
        member: String,
        /// Transport-level cause
        reason: String,
    },

    /// The ingress consumer has stopped.
    #[error("Event ingress closed")]
    IngressClosed,

    /// The ingress queue has no free slot.
    #[error("Event ingress queue full")]
    QueueFull,

    /// A configuration variable holds an unusable value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
