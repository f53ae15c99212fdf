//! Live connections and the room each one is attached to.

use std::collections::HashMap;

use partyhall_protocol::{ConnectionId, RoomCode, UserId, now_millis};
use tokio::sync::Mutex;

use crate::SessionError;

/// One live transport link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub user_id: UserId,
    /// The room this connection is attached to, if any.
    pub room_id: Option<RoomCode>,
    pub connected_at: u64,
}

/// Maps each live connection to its user and current room.
///
/// One record per connection. A user may hold several connections (a
/// reconnect racing the old socket's teardown); each is tracked on its own.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a connection that has completed its handshake.
    pub async fn register(&self, id: ConnectionId, user_id: UserId) -> Connection {
        let connection = Connection {
            id,
            user_id,
            room_id: None,
            connected_at: now_millis(),
        };
        let previous = self
            .connections
            .lock()
            .await
            .insert(id, connection.clone());
        if previous.is_some() {
            tracing::warn!(conn_id = %id, "connection registered twice, replacing record");
        }
        tracing::debug!(conn_id = %id, user_id = %connection.user_id, "connection registered");
        connection
    }

    pub async fn get(&self, id: ConnectionId) -> Option<Connection> {
        self.connections.lock().await.get(&id).cloned()
    }

    /// Points the connection at `room` (or at nothing) and returns the room
    /// it was attached to before.
    ///
    /// # Errors
    /// `SessionError::NotFound` if the connection is not registered.
    pub async fn set_room(
        &self,
        id: ConnectionId,
        room: Option<RoomCode>,
    ) -> Result<Option<RoomCode>, SessionError> {
        let mut connections = self.connections.lock().await;
        let connection = connections.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        Ok(std::mem::replace(&mut connection.room_id, room))
    }

    /// Clears the room pointer and returns what it was.
    ///
    /// Only the first of several racing callers gets `Some`, which makes the
    /// room-side leave run at most once per attachment.
    pub async fn take_room(&self, id: ConnectionId) -> Option<RoomCode> {
        self.connections
            .lock()
            .await
            .get_mut(&id)
            .and_then(|c| c.room_id.take())
    }

    /// Forgets a connection. Safe to call more than once.
    pub async fn remove(&self, id: ConnectionId) -> Option<Connection> {
        let removed = self.connections.lock().await.remove(&id);
        if removed.is_some() {
            tracing::debug!(conn_id = %id, "connection removed");
        }
        removed
    }

    /// Drops every record. Returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut connections = self.connections.lock().await;
        let count = connections.len();
        connections.clear();
        count
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }
}
