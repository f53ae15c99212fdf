//! Socket layer for Partyhall.
//!
//! The coordinator never touches sockets directly. It receives connections
//! through [`Transport`] and talks to each player through [`Connection`],
//! which moves opaque byte frames. The `websocket` feature (on by default)
//! provides the listener the server binary uses.

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned number for one socket.
///
/// A reconnecting user gets a fresh id, so rooms store it next to the
/// player to know which socket currently speaks for them. It travels as a
/// bare number in `welcome` and in player snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of new player connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Resolves once a peer has connected and is ready to exchange frames.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A live link to one player.
///
/// `send` and `recv` may run concurrently: the read loop parks in `recv`
/// while the outbox writer keeps pushing room broadcasts through `send`.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Next inbound frame, or `Ok(None)` once the peer has gone away cleanly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_display_has_prefix() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_serializes_as_bare_number() {
        let id = ConnectionId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: ConnectionId = serde_json::from_str("42").unwrap();
        assert_eq!(back.into_inner(), 42);
    }
}
