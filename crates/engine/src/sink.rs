//! Outbound sinks
//!
//! A sink is the engine's only view of a connection: it can be sent to and it
//! can report that it is closed. Each sink feeds an unbounded channel drained by
//! the connection's writer task, so sending never suspends and a slow socket
//! never stalls a game.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::core::GameSnapshot;
use crate::types::GameId;

/// Identifier of a connection (player or observer)
pub type SinkId = u64;

/// Message queued for a connection's writer task
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Game state; the terminal form when `game_over` is set
    State(Arc<GameSnapshot>),
    /// Reply to an observer's `?`
    Games(Vec<GameId>),
    /// Close the connection
    Close,
}

/// Sending half of a connection
#[derive(Debug, Clone)]
pub struct Sink {
    id: SinkId,
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Sink {
    /// Create a sink and the receiver its writer task drains
    pub fn channel(id: SinkId) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> SinkId {
        self.id
    }

    /// Best-effort delivery. Returns false if the connection is gone.
    pub fn send(&self, msg: Outbound) -> bool {
        match self.tx.send(msg) {
            Ok(()) => true,
            Err(_) => {
                debug!("Sink {} closed, message dropped", self.id);
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Ask the writer task to close the connection
    pub fn close(&self) {
        self.send(Outbound::Close);
    }
}
