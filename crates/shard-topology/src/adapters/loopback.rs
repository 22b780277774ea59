//! # Loopback Transport
//!
//! In-process [`ActionTransport`] that hands actions straight to the ingress
//! queue registered under a member's address. Used to run several nodes in
//! one process; individual links can be severed to drop deliveries.

use crate::domain::{Action, TopologyError};
use crate::ports::{ActionTransport, LiveMember};
use crate::service::IngressHandle;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Address-keyed registry of ingress handles.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    routes: RwLock<HashMap<String, IngressHandle>>,
    severed: RwLock<HashSet<String>>,
    delivered: AtomicU64,
}

impl LoopbackTransport {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route deliveries for `address` to `ingress`.
    pub fn register(&self, address: impl Into<String>, ingress: IngressHandle) {
        self.routes.write().insert(address.into(), ingress);
    }

    /// Drop every future delivery to `address`.
    pub fn sever(&self, address: &str) {
        self.severed.write().insert(address.to_string());
    }

    /// Undo [`Self::sever`].
    pub fn heal(&self, address: &str) {
        self.severed.write().remove(address);
    }

    /// Number of successful deliveries so far.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ActionTransport for LoopbackTransport {
    async fn deliver(&self, target: &LiveMember, action: Action) -> Result<(), TopologyError> {
        if self.severed.read().contains(&target.address) {
            return Err(TopologyError::Delivery {
                member: target.id.clone(),
                reason: "link severed".to_string(),
            });
        }

        let route = self.routes.read().get(&target.address).cloned();
        let Some(ingress) = route else {
            return Err(TopologyError::Delivery {
                member: target.id.clone(),
                reason: format!("no route to {}", target.address),
            });
        };

        ingress
            .submit(action)
            .await
            .map_err(|e| TopologyError::Delivery {
                member: target.id.clone(),
                reason: e.to_string(),
            })?;

        self.delivered.fetch_add(1, Ordering::Relaxed);
        trace!(target = %target, "Loopback delivery");
        Ok(())
    }
}
