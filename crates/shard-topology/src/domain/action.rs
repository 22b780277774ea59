//! # Actions
//!
//! Entity lifecycle events and their JSON wire form:
//!
//! ```text
//! { "kind": "start" | "stop", "member": "..", "shard": "..", "entity": "..", "forward": bool }
//! ```

use super::errors::TopologyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle transition carried by an [`Action`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// The entity started on `member/shard`.
    Start,
    /// The entity stopped on `member/shard`.
    Stop,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Start => f.write_str("start"),
            ActionKind::Stop => f.write_str("stop"),
        }
    }
}

/// An entity lifecycle event.
///
/// `forward` is set on events that originated on the local node; the copies
/// sent to other members always have it cleared so they are never re-sent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// Start or stop.
    pub kind: ActionKind,
    /// Member hosting the shard.
    pub member: String,
    /// Shard hosting the entity.
    pub shard: String,
    /// Entity identifier.
    pub entity: String,
    /// Whether the receiving node should fan the action out.
    #[serde(default)]
    pub forward: bool,
}

impl Action {
    /// A locally originated action (`forward` set).
    pub fn new(
        kind: ActionKind,
        member: impl Into<String>,
        shard: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            member: member.into(),
            shard: shard.into(),
            entity: entity.into(),
            forward: true,
        }
    }

    /// Locally originated `start`.
    pub fn start(
        member: impl Into<String>,
        shard: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        Self::new(ActionKind::Start, member, shard, entity)
    }

    /// Locally originated `stop`.
    pub fn stop(
        member: impl Into<String>,
        shard: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        Self::new(ActionKind::Stop, member, shard, entity)
    }

    /// Copy of this action that will not be forwarded again.
    #[must_use]
    pub fn as_no_forward(&self) -> Self {
        Self {
            forward: false,
            ..self.clone()
        }
    }

    /// Reject actions with an empty identifier.
    pub fn validate(&self) -> Result<(), TopologyError> {
        for (field, value) in [
            ("member", &self.member),
            ("shard", &self.shard),
            ("entity", &self.entity),
        ] {
            if value.trim().is_empty() {
                return Err(TopologyError::Decode(format!("empty {field} identifier")));
            }
        }
        Ok(())
    }

    /// Encode as a single-line JSON object.
    pub fn to_json(&self) -> Result<String, TopologyError> {
        serde_json::to_string(self).map_err(|e| TopologyError::Serialization(e.to_string()))
    }

    /// Decode and validate a JSON object.
    pub fn from_json(text: &str) -> Result<Self, TopologyError> {
        let action: Action =
            serde_json::from_str(text).map_err(|e| TopologyError::Decode(e.to_string()))?;
        action.validate()?;
        Ok(action)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}/{}",
            self.kind, self.member, self.shard, self.entity
        )?;
        if self.forward {
            f.write_str(" (forward)")?;
        }
        Ok(())
    }
}
