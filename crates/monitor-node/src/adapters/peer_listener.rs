//! # Peer Listener
//!
//! Accepts actions forwarded by other members and queues them on the local
//! ingress. Actions received here are never forwarded again, whatever their
//! `forward` flag says.

use crate::config::{NodeConfig, DEFAULT_PEER_MAX_LINE_BYTES};
use shard_topology::{Action, IngressHandle};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Bounds applied to every inbound peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerLimits {
    /// Longest accepted line, newline excluded. Longer lines close the connection.
    pub max_line_bytes: usize,
    /// A connection that delivers no complete line for this long is closed.
    pub idle_timeout: Duration,
}

impl Default for PeerLimits {
    fn default() -> Self {
        Self {
            max_line_bytes: DEFAULT_PEER_MAX_LINE_BYTES,
            idle_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&NodeConfig> for PeerLimits {
    fn from(config: &NodeConfig) -> Self {
        Self {
            max_line_bytes: config.peer_max_line_bytes.max(1),
            idle_timeout: config.peer_idle_timeout(),
        }
    }
}

/// TCP listener for newline-delimited Action JSON.
#[derive(Debug)]
pub struct PeerListener {
    listener: TcpListener,
    limits: PeerLimits,
}

impl PeerListener {
    /// Bind the listener.
    pub async fn bind(addr: &str, limits: PeerLimits) -> io::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr).await?,
            limits,
        })
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until shutdown is signalled.
    ///
    /// Open connections observe the same signal and close with the listener.
    pub async fn run(self, ingress: IngressHandle, mut shutdown: watch::Receiver<bool>) {
        info!(
            addr = ?self.listener.local_addr().ok(),
            max_line_bytes = self.limits.max_line_bytes,
            idle_timeout_ms = self.limits.idle_timeout.as_millis() as u64,
            "Peer listener started"
        );

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(handle_connection(
                            stream,
                            peer,
                            ingress.clone(),
                            self.limits,
                            shutdown.clone(),
                        ));
                    }
                    Err(e) => warn!(error = %e, "Peer accept failed"),
                },
            }
        }

        info!("Peer listener stopped");
    }
}

/// Outcome of one bounded line read.
#[derive(Debug, PartialEq, Eq)]
enum LineRead {
    Line(Vec<u8>),
    Eof,
    TooLong,
}

/// Read one line of at most `max` bytes plus its newline.
///
/// A trailing line without a newline is returned as is at EOF.
async fn read_line<R>(reader: &mut R, max: usize) -> io::Result<LineRead>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let read = (&mut *reader)
        .take(max as u64 + 1)
        .read_until(b'\n', &mut line)
        .await?;
    if read == 0 {
        return Ok(LineRead::Eof);
    }
    if line.last() == Some(&b'\n') {
        line.pop();
    } else if line.len() > max {
        return Ok(LineRead::TooLong);
    }
    Ok(LineRead::Line(line))
}

/// Read actions off one connection until EOF, idle timeout, an over-long
/// line or shutdown.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    ingress: IngressHandle,
    limits: PeerLimits,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut reader = BufReader::new(stream);
    let mut received = 0u64;

    while !*shutdown.borrow() {
        let read = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            read = tokio::time::timeout(
                limits.idle_timeout,
                read_line(&mut reader, limits.max_line_bytes),
            ) => read,
        };

        let line = match read {
            Ok(Ok(LineRead::Line(line))) => line,
            Ok(Ok(LineRead::Eof)) => break,
            Ok(Ok(LineRead::TooLong)) => {
                warn!(%peer, max = limits.max_line_bytes, "Peer line too long, closing connection");
                break;
            }
            Ok(Err(e)) => {
                warn!(%peer, error = %e, "Peer connection read failed");
                break;
            }
            Err(_) => {
                debug!(%peer, "Peer connection idle, closing");
                break;
            }
        };

        let Ok(text) = std::str::from_utf8(&line) else {
            warn!(%peer, "Non UTF-8 peer line skipped");
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }

        let action = match Action::from_json(text) {
            Ok(action) => action,
            Err(e) => {
                warn!(%peer, error = %e, "Malformed peer action skipped");
                continue;
            }
        };
        if action.forward {
            debug!(%peer, %action, "Clearing forward flag on peer action");
        }

        if let Err(e) = ingress.submit(action.as_no_forward()).await {
            warn!(%peer, error = %e, "Peer action dropped");
            break;
        }
        received += 1;
    }

    debug!(%peer, received, "Peer connection closed");
}
