//! # Shard Monitor Test Suite
//!
//! Unified test crate for flows that span more than one node.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── cluster_flows.rs   # in-process clusters over the loopback transport
//!     └── node_flows.rs      # real nodes over TCP, HTTP and WebSocket
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p monitor-tests
//! cargo test -p monitor-tests integration::cluster_flows
//! ```

pub mod integration;
