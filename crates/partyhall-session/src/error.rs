//! Error types for the session layer.

use partyhall_protocol::ConnectionId;

/// Errors that can occur while identifying or tracking connections.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The identity token was rejected by the
    /// [`Authenticator`](crate::Authenticator).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// No record exists for this connection. It either never completed the
    /// handshake or has already been torn down.
    #[error("connection {0} is not registered")]
    NotFound(ConnectionId),
}
