//! Delivery of notifications to connections and room groups.
//!
//! Each connection owns an unbounded outbox drained by its writer task, so
//! pushing a notification never waits on a slow socket.

use std::collections::{HashMap, HashSet};

use partyhall_protocol::{ConnectionId, RoomCode};
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use crate::Notification;

/// Sending half of a connection's outbox.
pub type Outbox = UnboundedSender<Notification>;

#[derive(Default)]
struct Routes {
    outboxes: HashMap<ConnectionId, Outbox>,
    groups: HashMap<RoomCode, HashSet<ConnectionId>>,
}

/// Routes notifications to single connections or to every connection
/// attached to a room.
///
/// Delivery is best effort: a closed outbox is logged and skipped, and
/// never fails the request that produced the notification.
#[derive(Default)]
pub struct Broadcaster {
    routes: Mutex<Routes>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, conn: ConnectionId, outbox: Outbox) {
        self.routes.lock().await.outboxes.insert(conn, outbox);
    }

    /// Forgets a connection and takes it out of every group.
    pub async fn unregister(&self, conn: ConnectionId) {
        let mut routes = self.routes.lock().await;
        routes.outboxes.remove(&conn);
        routes.groups.retain(|_, members| {
            members.remove(&conn);
            !members.is_empty()
        });
    }

    pub async fn join_group(&self, room: &RoomCode, conn: ConnectionId) {
        self.routes
            .lock()
            .await
            .groups
            .entry(room.clone())
            .or_default()
            .insert(conn);
    }

    pub async fn leave_group(&self, room: &RoomCode, conn: ConnectionId) {
        let mut routes = self.routes.lock().await;
        if let Some(members) = routes.groups.get_mut(room) {
            members.remove(&conn);
            if members.is_empty() {
                routes.groups.remove(room);
            }
        }
    }

    pub async fn drop_group(&self, room: &RoomCode) {
        self.routes.lock().await.groups.remove(room);
    }

    /// Connections currently attached to `room`.
    pub async fn members(&self, room: &RoomCode) -> Vec<ConnectionId> {
        self.routes
            .lock()
            .await
            .groups
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Pushes one notification to one connection.
    pub async fn send_to(&self, conn: ConnectionId, notification: Notification) {
        let routes = self.routes.lock().await;
        deliver(&routes, conn, notification);
    }

    /// Pushes a notification to every connection in `room`.
    pub async fn broadcast(&self, room: &RoomCode, notification: &Notification) {
        let routes = self.routes.lock().await;
        let Some(members) = routes.groups.get(room) else {
            return;
        };
        tracing::debug!(room_id = %room, event = notification.name(), recipients = members.len(), "broadcast");
        for &conn in members {
            deliver(&routes, conn, notification.clone());
        }
    }

    /// Drops every outbox and group. Writer tasks see their outbox close
    /// and shut their sockets down.
    pub async fn clear(&self) -> usize {
        let mut routes = self.routes.lock().await;
        let count = routes.outboxes.len();
        routes.outboxes.clear();
        routes.groups.clear();
        count
    }
}

fn deliver(routes: &Routes, conn: ConnectionId, notification: Notification) {
    let event = notification.name();
    match routes.outboxes.get(&conn) {
        Some(outbox) => {
            if outbox.send(notification).is_err() {
                tracing::warn!(conn_id = %conn, event, "outbox closed, notification dropped");
            }
        }
        None => tracing::debug!(conn_id = %conn, event, "no outbox for connection"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partyhall_protocol::ErrorCode;
    use tokio::sync::mpsc;

    fn pong() -> Notification {
        Notification::Pong {
            client_time: 1,
            server_time: 2,
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_only_group_members() {
        let broadcaster = Broadcaster::new();
        let (a_tx, mut a_rx) = mpsc::unbounded_channel();
        let (b_tx, mut b_rx) = mpsc::unbounded_channel();
        broadcaster.register(ConnectionId::new(1), a_tx).await;
        broadcaster.register(ConnectionId::new(2), b_tx).await;
        let room = RoomCode::new("ROOM01");
        broadcaster.join_group(&room, ConnectionId::new(1)).await;

        broadcaster.broadcast(&room, &pong()).await;

        assert!(matches!(a_rx.try_recv(), Ok(Notification::Pong { .. })));
        assert!(b_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_outbox_does_not_block_others() {
        let broadcaster = Broadcaster::new();
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, mut b_rx) = mpsc::unbounded_channel();
        broadcaster.register(ConnectionId::new(1), a_tx).await;
        broadcaster.register(ConnectionId::new(2), b_tx).await;
        drop(a_rx);
        let room = RoomCode::new("ROOM01");
        broadcaster.join_group(&room, ConnectionId::new(1)).await;
        broadcaster.join_group(&room, ConnectionId::new(2)).await;

        broadcaster
            .broadcast(&room, &Notification::error(ErrorCode::RoomFull, "x"))
            .await;

        assert!(matches!(b_rx.try_recv(), Ok(Notification::Error { .. })));
    }

    #[tokio::test]
    async fn test_unregister_removes_from_groups() {
        let broadcaster = Broadcaster::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        broadcaster.register(ConnectionId::new(1), tx).await;
        let room = RoomCode::new("ROOM01");
        broadcaster.join_group(&room, ConnectionId::new(1)).await;

        broadcaster.unregister(ConnectionId::new(1)).await;

        assert!(broadcaster.members(&room).await.is_empty());
    }
}
