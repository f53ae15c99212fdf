//! Per-connection handler: the handshake, then the read loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `hello`, check the protocol version
//!   2. Authenticate the token and register the connection
//!   3. Spawn the writer that drains the connection's outbox
//!   4. Loop: decode client events and hand them to the coordinator

use std::sync::Arc;

use partyhall_protocol::{
    ClientEvent, Codec, ConnectionId, ErrorCode, Hello, PROTOCOL_VERSION, ProtocolError, UserId,
};
use partyhall_session::Authenticator;
use partyhall_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::server::ServerState;
use crate::{CoordinatorError, Notification, PartyhallError, SessionCoordinator};

/// Drop guard that tears the connection down in the coordinator when the
/// handler exits, even on a panic. `Drop` is synchronous, so the async
/// cleanup runs in a spawned task.
struct SessionGuard {
    conn_id: ConnectionId,
    coordinator: Arc<SessionCoordinator>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let coordinator = Arc::clone(&self.coordinator);
        tokio::spawn(async move {
            coordinator.disconnect(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A, C>>,
) -> Result<(), PartyhallError>
where
    A: Authenticator,
    C: Codec,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let user_id = match perform_handshake(&conn, &state).await {
        Ok(user_id) => user_id,
        Err(e) => {
            let _ = conn.close().await;
            return Err(e);
        }
    };

    let (outbox, inbox) = mpsc::unbounded_channel();
    tokio::spawn(write_outbox(Arc::clone(&conn), Arc::clone(&state), inbox));
    state.coordinator.connect(conn_id, user_id.clone(), outbox).await;
    let _guard = SessionGuard {
        conn_id,
        coordinator: Arc::clone(&state.coordinator),
    };

    loop {
        let data = match tokio::time::timeout(state.config.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%conn_id, %user_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%conn_id, %user_id, "connection idle, dropping");
                break;
            }
        };

        match state.codec.decode::<ClientEvent>(&data) {
            Ok(event) => state.coordinator.handle(conn_id, event).await,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode client event");
                let error = CoordinatorError::InvalidMessage(e.to_string());
                state.coordinator.reject(conn_id, &error).await;
            }
        }
    }

    // _guard drops here and the disconnect runs.
    Ok(())
}

/// Waits for `hello` and asks the authenticator who sent it.
///
/// Every failure is answered with a `HANDSHAKE_FAILED` error frame before
/// the caller closes the socket.
async fn perform_handshake<A, C>(
    conn: &WebSocketConnection,
    state: &ServerState<A, C>,
) -> Result<UserId, PartyhallError>
where
    A: Authenticator,
    C: Codec,
{
    let refusal = match tokio::time::timeout(state.config.handshake_timeout, conn.recv()).await {
        Ok(Ok(Some(data))) => match state.codec.decode::<ClientEvent>(&data) {
            Ok(ClientEvent::Hello(Hello { version, token })) if version == PROTOCOL_VERSION => {
                return authenticate(conn, state, token.as_deref()).await;
            }
            Ok(ClientEvent::Hello(Hello { version, .. })) => ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                got: version,
            },
            _ => ProtocolError::Handshake("first frame must be hello".into()),
        },
        Ok(Ok(None)) => {
            return Err(ProtocolError::Handshake("connection closed before hello".into()).into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => ProtocolError::Handshake("timed out waiting for hello".into()),
    };
    send_error(conn, &state.codec, &refusal.to_string()).await?;
    Err(refusal.into())
}

async fn authenticate<A, C>(
    conn: &WebSocketConnection,
    state: &ServerState<A, C>,
    token: Option<&str>,
) -> Result<UserId, PartyhallError>
where
    A: Authenticator,
    C: Codec,
{
    match state.auth.authenticate(token).await {
        Ok(user_id) => {
            tracing::info!(conn_id = %conn.id(), %user_id, "client authenticated");
            Ok(user_id)
        }
        Err(e) => {
            send_error(conn, &state.codec, &e.to_string()).await?;
            Err(e.into())
        }
    }
}

/// Drains a connection's outbox onto the socket until the outbox closes
/// or a send fails, then closes the socket.
async fn write_outbox<A, C>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<A, C>>,
    mut inbox: UnboundedReceiver<Notification>,
) where
    A: Authenticator,
    C: Codec,
{
    let conn_id = conn.id();
    while let Some(notification) = inbox.recv().await {
        let bytes = match state.codec.encode(&notification) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%conn_id, event = notification.name(), error = %e, "encode failed");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
    let _ = conn.close().await;
    tracing::debug!(%conn_id, "writer finished");
}

/// Writes a `HANDSHAKE_FAILED` error frame straight to the socket.
async fn send_error(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    message: &str,
) -> Result<(), PartyhallError> {
    let bytes = codec.encode(&Notification::error(ErrorCode::HandshakeFailed, message))?;
    conn.send(&bytes).await?;
    Ok(())
}
