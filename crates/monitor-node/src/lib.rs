//! # Monitor Node
//!
//! Runtime hosting one shard-topology core.
//!
//! ## Startup Sequence
//!
//! 1. Resolve own identity (node id, advertised host)
//! 2. Bind the peer listener and build the membership view
//! 3. Spawn the topology core with the TCP action transport
//! 4. Bind the observer gateway
//!
//! ```text
//!   peers ──TCP──► PeerListener ─┐
//!                                ├─► TopologyHandle ──► ActionBroadcaster ──TCP──► peers
//!   POST /actions ──► gateway ───┘          │
//!                                           ▼
//!   /events (WebSocket) ◄──────── SnapshotPublisher
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod config;
pub mod error;
pub mod gateway;
pub mod identity;

pub use adapters::{PeerLimits, PeerListener, TcpActionTransport};
pub use config::{parse_peers, ConfigError, NodeConfig};
pub use error::NodeError;
pub use gateway::{router, AssetStore, GatewayState, ObserverReply, ObserverSession};
pub use identity::NodeIdentity;

use futures::future::join_all;
use shard_telemetry::log_event;
use shard_topology::{LiveMember, StaticMembership, TopologyHandle, TopologyService};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A running node: peer listener, topology core and observer gateway.
pub struct MonitorNode {
    identity: NodeIdentity,
    member: LiveMember,
    membership: Arc<StaticMembership>,
    topology: TopologyHandle,
    http_addr: SocketAddr,
    peer_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl MonitorNode {
    /// Start every component of the node on the current runtime.
    ///
    /// Fails with [`NodeError::Topology`] (startup failure) when the node
    /// cannot resolve its identity, or [`NodeError::Bind`] when a listener
    /// cannot be bound. Nothing is left running on failure.
    pub async fn start(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let identity = identity::resolve(&config)?;

        let peer_bind = config.peer_bind_addr();
        let peer_listener = PeerListener::bind(&peer_bind, PeerLimits::from(&config))
            .await
            .map_err(|source| bind_error("peer", &peer_bind, source))?;
        let peer_addr = peer_listener
            .local_addr()
            .map_err(|source| bind_error("peer", &peer_bind, source))?;

        let http_bind = config.http_bind_addr();
        let http_listener = TcpListener::bind(&http_bind)
            .await
            .map_err(|source| bind_error("http", &http_bind, source))?;
        let http_addr = http_listener
            .local_addr()
            .map_err(|source| bind_error("http", &http_bind, source))?;

        let member = identity.member(peer_addr.port());
        let membership = Arc::new(StaticMembership::new(member.clone(), config.peers.clone()));
        let transport = Arc::new(TcpActionTransport::new(config.delivery_timeout()));
        let (topology, core_task) =
            TopologyService::spawn(&config.topology, Arc::clone(&membership), transport);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let peer_task = tokio::spawn(peer_listener.run(topology.ingress(), shutdown_rx.clone()));

        let state = GatewayState::new(topology.clone(), AssetStore::new(&config.asset_dir));
        let app = router(state);
        let gateway_task = tokio::spawn(async move {
            let mut shutdown_rx = shutdown_rx;
            let signal = async move {
                // A dropped sender also means shutdown.
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            };
            if let Err(e) = gateway::serve(http_listener, app, signal).await {
                log_event!(error, "gateway", "Observer gateway failed", error = %e);
            }
        });

        log_event!(
            info,
            "node",
            "Monitor node started",
            member = %member,
            http = %http_addr,
            peers = config.peers.len()
        );

        Ok(Self {
            identity,
            member,
            membership,
            topology,
            http_addr,
            peer_addr,
            shutdown_tx,
            tasks: vec![core_task, peer_task, gateway_task],
        })
    }

    /// Resolved identity.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Membership entry other nodes use to reach this one.
    pub fn member(&self) -> &LiveMember {
        &self.member
    }

    /// Membership view, for hosts that track liveness themselves.
    pub fn membership(&self) -> &Arc<StaticMembership> {
        &self.membership
    }

    /// Handle to the topology core.
    pub fn topology(&self) -> &TopologyHandle {
        &self.topology
    }

    /// Bound observer gateway address.
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    /// Bound peer listener address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Stop every component and wait for them to finish.
    pub async fn shutdown(self) {
        log_event!(info, "node", "Shutting down monitor node", member = %self.member);

        self.shutdown_tx.send_replace(true);
        self.topology.shutdown();

        for result in join_all(self.tasks).await {
            if let Err(e) = result {
                log_event!(warn, "node", "Task ended abnormally", error = %e);
            }
        }

        log_event!(info, "node", "Monitor node stopped", member = %self.member);
    }
}

fn bind_error(listener: &'static str, addr: &str, source: std::io::Error) -> NodeError {
    NodeError::Bind {
        listener,
        addr: addr.to_string(),
        source,
    }
}
