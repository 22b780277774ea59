//! # Observer Sessions
//!
//! One session per WebSocket connection on `/events`. Every inbound text
//! frame, whatever its content, is answered with exactly one snapshot
//! document. Binary input is a protocol violation and ends the session with
//! close code 1003.

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use shard_topology::{SnapshotPublisher, TopologyError};
use std::borrow::Cow;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What to do with one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverReply {
    /// Send this snapshot document.
    Send(String),
    /// Close the connection with the given violation.
    Close(TopologyError),
    /// The peer closed the connection.
    Finish,
    /// Nothing to send.
    Ignore,
}

/// State of one observer connection.
#[derive(Debug)]
pub struct ObserverSession {
    connection_id: Uuid,
    publisher: SnapshotPublisher,
    served: u64,
}

impl ObserverSession {
    /// Start a session reading snapshots from `publisher`.
    #[must_use]
    pub fn new(publisher: SnapshotPublisher) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            publisher,
            served: 0,
        }
    }

    /// Connection id used in log records.
    #[must_use]
    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Snapshots sent so far.
    #[must_use]
    pub fn served(&self) -> u64 {
        self.served
    }

    /// Decide the reply to one inbound frame.
    pub fn respond(&mut self, message: &Message) -> ObserverReply {
        match message {
            Message::Text(_) => {
                self.served += 1;
                ObserverReply::Send(self.publisher.render())
            }
            Message::Binary(data) => ObserverReply::Close(TopologyError::ProtocolViolation(
                format!("binary frame of {} bytes", data.len()),
            )),
            Message::Close(_) => ObserverReply::Finish,
            // Pongs are sent by the transport.
            Message::Ping(_) | Message::Pong(_) => ObserverReply::Ignore,
        }
    }

    /// Drive the connection until either side closes it.
    pub async fn serve(mut self, mut socket: WebSocket) {
        info!(connection_id = %self.connection_id, "Observer connected");

        while let Some(received) = socket.recv().await {
            let message = match received {
                Ok(message) => message,
                Err(e) => {
                    warn!(connection_id = %self.connection_id, error = %e, "Observer socket error");
                    break;
                }
            };

            match self.respond(&message) {
                ObserverReply::Send(document) => {
                    if let Err(e) = socket.send(Message::Text(document)).await {
                        warn!(connection_id = %self.connection_id, error = %e, "Snapshot send failed");
                        break;
                    }
                }
                ObserverReply::Close(violation) => {
                    warn!(connection_id = %self.connection_id, error = %violation, "Closing observer");
                    let frame = CloseFrame {
                        code: close_code::UNSUPPORTED,
                        reason: Cow::Borrowed("binary frames are not supported"),
                    };
                    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
                        debug!(connection_id = %self.connection_id, error = %e, "Close frame not sent");
                    }
                    break;
                }
                ObserverReply::Finish => break,
                ObserverReply::Ignore => {}
            }
        }

        info!(
            connection_id = %self.connection_id,
            served = self.served,
            "Observer disconnected"
        );
    }
}
