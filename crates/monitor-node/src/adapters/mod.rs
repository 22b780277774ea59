//! # Adapters
//!
//! Network implementations of the topology core's transport port.

pub mod peer_listener;
pub mod tcp_transport;

pub use peer_listener::{PeerLimits, PeerListener};
pub use tcp_transport::TcpActionTransport;
