use std::io;

#[cfg(feature = "websocket")]
use tokio_tungstenite::tungstenite;

/// Failures of the socket layer underneath the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not take the requested address.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The TCP accept call itself failed.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// A TCP peer connected but never completed the WebSocket upgrade.
    #[cfg(feature = "websocket")]
    #[error("websocket upgrade failed: {0}")]
    Upgrade(#[source] tungstenite::Error),

    /// Writing a frame to the peer failed.
    #[cfg(feature = "websocket")]
    #[error("write to peer failed: {0}")]
    Write(#[source] tungstenite::Error),

    /// Reading a frame from the peer failed.
    #[cfg(feature = "websocket")]
    #[error("read from peer failed: {0}")]
    Read(#[source] tungstenite::Error),

    /// The peer is gone and the link can no longer carry frames.
    #[error("peer {0} is gone")]
    Closed(String),
}
