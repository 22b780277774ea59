//! # TCP Action Transport
//!
//! [`ActionTransport`] over plain TCP: one connection per delivery attempt,
//! carrying a single newline-terminated Action JSON object. Connect and write
//! share one timeout; nothing is acknowledged or retried.

use async_trait::async_trait;
use shard_topology::{Action, ActionTransport, LiveMember, TopologyError};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::trace;

/// Fire-and-forget TCP delivery.
#[derive(Debug, Clone)]
pub struct TcpActionTransport {
    timeout: Duration,
}

impl TcpActionTransport {
    /// Create a transport bounding each attempt by `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ActionTransport for TcpActionTransport {
    async fn deliver(&self, target: &LiveMember, action: Action) -> Result<(), TopologyError> {
        let mut line = action.to_json()?;
        line.push('\n');

        let attempt = async {
            let mut stream = TcpStream::connect(&target.address).await?;
            stream.write_all(line.as_bytes()).await?;
            stream.shutdown().await
        };

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(Ok(())) => {
                trace!(target = %target, bytes = line.len(), "Action written");
                Ok(())
            }
            Ok(Err(e)) => Err(TopologyError::Delivery {
                member: target.id.clone(),
                reason: e.to_string(),
            }),
            Err(_) => Err(TopologyError::Delivery {
                member: target.id.clone(),
                reason: format!("timed out after {} ms", self.timeout.as_millis()),
            }),
        }
    }
}
