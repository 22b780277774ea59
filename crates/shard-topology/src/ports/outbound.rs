//! # Outbound Ports
//!
//! Traits for the collaborators the topology core does not own: cluster
//! membership and the transport reaching other members' ingress.

use crate::domain::{Action, TopologyError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A member currently reported live by the membership collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LiveMember {
    /// Member identifier, the same string used as member name in actions.
    pub id: String,
    /// Transport address of the member's ingress.
    pub address: String,
}

impl LiveMember {
    /// Create a member entry.
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for LiveMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.address)
    }
}

/// Parses the `id@address` form used in configuration.
impl FromStr for LiveMember {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('@') {
            Some((id, address)) if !id.is_empty() && !address.is_empty() => {
                Ok(LiveMember::new(id, address))
            }
            _ => Err(TopologyError::Decode(format!(
                "member spec '{s}' is not of the form id@address"
            ))),
        }
    }
}

/// Membership view - outbound port.
///
/// The core never discovers membership itself; the host answers these.
pub trait MembershipView: Send + Sync {
    /// This node's own identity.
    fn self_member(&self) -> LiveMember;

    /// Members currently live, in a stable order. May include self.
    fn live_members(&self) -> Vec<LiveMember>;
}

/// Action transport - outbound port.
///
/// One call is one delivery attempt: no retry, no acknowledgment.
#[async_trait]
pub trait ActionTransport: Send + Sync {
    /// Hand `action` to the ingress of `target`.
    async fn deliver(&self, target: &LiveMember, action: Action) -> Result<(), TopologyError>;
}
