//! # Adapters
//!
//! In-process implementations of the outbound ports.

pub mod loopback;
pub mod membership;

pub use loopback::LoopbackTransport;
pub use membership::StaticMembership;
