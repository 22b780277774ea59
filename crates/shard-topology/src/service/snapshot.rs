//! # Snapshot Publisher
//!
//! Renders the latest published topology version for observers.
//!
//! The ingress consumer publishes an immutable `Arc<TopologyNode>` after every
//! mutation; readers only ever see those versions, never live state.

use crate::domain::{TopologyError, TopologyNode};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::error;

/// Encode `value` as a JSON document, or as an error document on failure.
///
/// Never fails: a serialization error yields `{ "error": "<message>" }`.
pub fn render_document<T: Serialize + ?Sized>(value: &T, pretty: bool) -> String {
    let encoded = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    encoded.unwrap_or_else(|e| {
        let err = TopologyError::Serialization(e.to_string());
        error!(error = %err, "Snapshot rendering failed");
        error_document(&err.to_string())
    })
}

/// The well-formed document returned instead of a snapshot on failure.
#[must_use]
pub fn error_document(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

/// Decode a snapshot document back into a node tree.
pub fn decode_snapshot(text: &str) -> Result<TopologyNode, TopologyError> {
    serde_json::from_str(text).map_err(|e| TopologyError::Decode(e.to_string()))
}

/// Read side of the published topology versions.
#[derive(Clone, Debug)]
pub struct SnapshotPublisher {
    versions: watch::Receiver<Arc<TopologyNode>>,
    pretty: bool,
}

impl SnapshotPublisher {
    pub(crate) fn new(versions: watch::Receiver<Arc<TopologyNode>>, pretty: bool) -> Self {
        Self { versions, pretty }
    }

    /// Latest published version.
    #[must_use]
    pub fn current(&self) -> Arc<TopologyNode> {
        self.versions.borrow().clone()
    }

    /// Latest published version as a snapshot document.
    #[must_use]
    pub fn render(&self) -> String {
        render_document(self.current().as_ref(), self.pretty)
    }

    /// Wait for the next published version.
    ///
    /// Fails with [`TopologyError::IngressClosed`] once the consumer is gone.
    pub async fn changed(&mut self) -> Result<Arc<TopologyNode>, TopologyError> {
        self.versions
            .changed()
            .await
            .map_err(|_| TopologyError::IngressClosed)?;
        Ok(self.versions.borrow_and_update().clone())
    }
}
