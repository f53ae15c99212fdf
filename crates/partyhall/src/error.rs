//! Error types for the coordinator and the server.

use partyhall_protocol::{ConnectionId, ErrorCode, ProtocolError};
use partyhall_room::RoomError;
use partyhall_session::SessionError;
use partyhall_transport::TransportError;

/// A request the coordinator refused.
///
/// Always reported to the requesting connection as an `error` frame; never
/// closes the connection or touches the room.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinatorError {
    /// The connection has not completed a handshake, or was already torn
    /// down.
    #[error("connection {0} is not registered")]
    NotConnected(ConnectionId),

    /// Bad room settings or an unknown game type.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The frame could not be understood.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error(transparent)]
    Room(#[from] RoomError),
}

impl CoordinatorError {
    /// The stable code sent to clients.
    pub fn code(&self) -> ErrorCode {
        match self {
            CoordinatorError::NotConnected(_) => ErrorCode::HandshakeFailed,
            CoordinatorError::InvalidConfiguration(_) => ErrorCode::InvalidConfiguration,
            CoordinatorError::InvalidMessage(_) => ErrorCode::InvalidAction,
            CoordinatorError::Room(e) => e.code(),
        }
    }
}

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PartyhallError {
    /// The socket layer failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad handshake).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An identity or connection-tracking error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Binding or serving the operational HTTP listener failed.
    #[error("admin listener: {0}")]
    Admin(#[source] std::io::Error),
}
