//! # Domain Module
//!
//! Core domain types for the topology subsystem.

pub mod action;
pub mod config;
pub mod errors;
pub mod invariants;
pub mod node;
pub mod tree;

pub use action::*;
pub use config::*;
pub use errors::*;
pub use invariants::*;
pub use node::*;
pub use tree::*;
