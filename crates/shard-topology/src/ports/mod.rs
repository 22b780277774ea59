//! # Ports Module
//!
//! Hexagonal boundaries of the topology subsystem.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
