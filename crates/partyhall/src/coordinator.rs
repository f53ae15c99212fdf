//! The session coordinator: turns inbound client events into room changes
//! and outbound notifications.
//!
//! Lock order is room before registry. The registries only hold their map
//! locks for a lookup or an insert, and never wait on a room while doing
//! so, which lets notifications for a room be pushed while its lock is
//! still held. Every member therefore sees that room's notifications in
//! the order the room changed.

use partyhall_games::{GameError, GameType};
use partyhall_protocol::{
    Avatar, ClientEvent, ConnectionId, CreateRoomRequest, GameActionRequest, JoinRoomRequest,
    PROTOCOL_VERSION, Ping, RoomCode, StartGameRequest, UserId, now_millis,
};
use partyhall_room::{
    JoinOutcome, LeaveOutcome, NewPlayer, Room, RoomError, RoomRegistry, SharedRoom,
};
use partyhall_session::{Connection, ConnectionRegistry};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;

use crate::broadcast::{Broadcaster, Outbox};
use crate::{CoordinatorError, Notification};

/// Display name for players who didn't give one.
pub const DEFAULT_PLAYER_NAME: &str = "Player";

/// Owns the registries and the broadcast groups, and runs every client
/// request against them.
pub struct SessionCoordinator {
    rooms: RoomRegistry,
    connections: ConnectionRegistry,
    broadcaster: Broadcaster,
    rng: Mutex<StdRng>,
}

impl SessionCoordinator {
    /// Builds a coordinator over the given registries.
    ///
    /// With a `seed`, every random draw the coordinator makes is
    /// reproducible.
    pub fn new(rooms: RoomRegistry, connections: ConnectionRegistry, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self {
            rooms,
            connections,
            broadcaster: Broadcaster::new(),
            rng: Mutex::new(rng),
        }
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// A private generator for one request, split off the shared one so the
    /// shared lock is never held across an await.
    async fn request_rng(&self) -> StdRng {
        StdRng::from_rng(&mut *self.rng.lock().await)
    }

    /// Registers a connection that passed its handshake and replies
    /// `welcome` through `outbox`.
    pub async fn connect(&self, conn: ConnectionId, user_id: UserId, outbox: Outbox) -> Connection {
        self.broadcaster.register(conn, outbox).await;
        let connection = self.connections.register(conn, user_id.clone()).await;
        tracing::info!(conn_id = %conn, %user_id, "client connected");
        self.broadcaster
            .send_to(
                conn,
                Notification::Welcome {
                    user_id,
                    connection_id: conn,
                    protocol_version: PROTOCOL_VERSION,
                    server_time: now_millis(),
                },
            )
            .await;
        connection
    }

    /// Runs one client event. A refused request is answered with an `error`
    /// frame to `conn` alone.
    pub async fn handle(&self, conn: ConnectionId, event: ClientEvent) {
        let result = match event {
            ClientEvent::Hello(_) => Err(CoordinatorError::InvalidMessage(
                "handshake already completed".into(),
            )),
            ClientEvent::CreateRoom(req) => self.create_room(conn, req).await,
            ClientEvent::JoinRoom(req) => self.join_room(conn, req).await,
            ClientEvent::LeaveRoom(_) => self.leave_room(conn).await,
            ClientEvent::StartGame(req) => self.start_game(conn, req).await,
            ClientEvent::GameAction(req) => self.game_action(conn, req).await,
            ClientEvent::ListRooms => self.list_rooms(conn).await,
            ClientEvent::Ping(ping) => self.ping(conn, ping).await,
        };
        if let Err(e) = result {
            self.reject(conn, &e).await;
        }
    }

    /// Sends `error` for a refused request.
    pub async fn reject(&self, conn: ConnectionId, error: &CoordinatorError) {
        tracing::debug!(conn_id = %conn, code = ?error.code(), %error, "request rejected");
        self.broadcaster
            .send_to(conn, Notification::error(error.code(), error.to_string()))
            .await;
    }

    async fn connection(&self, conn: ConnectionId) -> Result<Connection, CoordinatorError> {
        self.connections
            .get(conn)
            .await
            .ok_or(CoordinatorError::NotConnected(conn))
    }

    async fn room_handle(&self, id: &RoomCode) -> Result<SharedRoom, CoordinatorError> {
        self.rooms
            .get(id)
            .await
            .ok_or_else(|| RoomError::NotFound(id.clone()).into())
    }

    /// Creates a room owned by the connection's user and moves the
    /// connection into it.
    ///
    /// # Errors
    /// `InvalidConfiguration` for an unknown game type or a bad seat limit.
    pub async fn create_room(
        &self,
        conn: ConnectionId,
        req: CreateRoomRequest,
    ) -> Result<(), CoordinatorError> {
        let connection = self.connection(conn).await?;
        let game_type: GameType = req
            .game_type
            .parse()
            .map_err(|e: GameError| CoordinatorError::InvalidConfiguration(e.to_string()))?;
        let owner = new_player(&connection, req.user_name, req.avatar);

        let mut rng = self.request_rng().await;
        let handle = self
            .rooms
            .create_room(
                owner,
                req.name.trim().to_string(),
                game_type,
                req.settings.unwrap_or_default(),
                req.is_private,
                &mut rng,
            )
            .await?;

        // The new room is not attached yet, so this only leaves the old one.
        self.detach(conn, &connection.user_id).await;

        let room = handle.lock().await;
        if self.connections.set_room(conn, Some(room.id.clone())).await.is_err() {
            // The connection went away while the room was being built.
            self.rooms.delete(&room.id).await;
            return Err(CoordinatorError::NotConnected(conn));
        }
        self.broadcaster.join_group(&room.id, conn).await;
        self.broadcaster
            .send_to(conn, Notification::RoomCreated(room.clone()))
            .await;
        Ok(())
    }

    /// Joins a room, or rebinds an existing member to this connection.
    ///
    /// The connection's previous room is left only once the new room has
    /// accepted it, so a refused join leaves the current room untouched.
    ///
    /// # Errors
    /// `RoomNotFound` if there is no such room, `RoomFull` if a new member
    /// would exceed the seat limit.
    pub async fn join_room(
        &self,
        conn: ConnectionId,
        req: JoinRoomRequest,
    ) -> Result<(), CoordinatorError> {
        let connection = self.connection(conn).await?;
        let handle = self.room_handle(&req.room_id).await?;
        let player = new_player(&connection, req.user_name, req.avatar);

        let mut room = handle.lock().await;
        let stale = room
            .player(&connection.user_id)
            .map(|p| p.connection_id)
            .filter(|old| *old != conn);
        let outcome = room.join(player)?;

        let left_behind = match self.connections.set_room(conn, Some(room.id.clone())).await {
            Ok(previous) => previous.filter(|old| *old != room.id),
            Err(_) => {
                if let LeaveOutcome::Left { now_empty: true, .. } = room.leave(&connection.user_id, conn) {
                    self.rooms.delete(&room.id).await;
                }
                return Err(CoordinatorError::NotConnected(conn));
            }
        };
        if let Some(old) = stale {
            self.release_stale(old, &room.id).await;
        }
        if let Some(old_room) = &left_behind {
            self.broadcaster.leave_group(old_room, conn).await;
        }
        self.broadcaster.join_group(&room.id, conn).await;

        if outcome == JoinOutcome::Joined {
            if let Some(player) = room.player(&connection.user_id) {
                self.broadcaster
                    .broadcast(&room.id, &Notification::PlayerJoined(player.clone()))
                    .await;
            }
        }
        self.broadcaster
            .send_to(conn, Notification::RoomJoined(room.clone()))
            .await;
        drop(room);

        if let Some(old_room) = left_behind {
            self.depart(conn, &connection.user_id, old_room).await;
        }
        Ok(())
    }

    /// Detaches a connection that no longer speaks for its player.
    async fn release_stale(&self, old: ConnectionId, room_id: &RoomCode) {
        if let Some(stale) = self.connections.get(old).await {
            if stale.room_id.as_ref() == Some(room_id) {
                let _ = self.connections.set_room(old, None).await;
            }
        }
        self.broadcaster.leave_group(room_id, old).await;
        tracing::debug!(conn_id = %old, room_id = %room_id, "stale connection detached");
    }

    /// Leaves the connection's current room. Without one this does nothing.
    pub async fn leave_room(&self, conn: ConnectionId) -> Result<(), CoordinatorError> {
        let connection = self.connection(conn).await?;
        self.detach(conn, &connection.user_id).await;
        Ok(())
    }

    /// Takes the connection out of its room, if it has one.
    ///
    /// The room pointer is taken atomically, so when a leave races a
    /// disconnect only one of them reaches the room.
    async fn detach(&self, conn: ConnectionId, user_id: &UserId) -> Option<LeaveOutcome> {
        let room_id = self.connections.take_room(conn).await?;
        self.depart(conn, user_id, room_id).await
    }

    /// Removes the user from `room_id` on behalf of `conn`, which no longer
    /// points at that room.
    async fn depart(
        &self,
        conn: ConnectionId,
        user_id: &UserId,
        room_id: RoomCode,
    ) -> Option<LeaveOutcome> {
        self.broadcaster.leave_group(&room_id, conn).await;
        let handle = self.rooms.get(&room_id).await?;

        let mut room = handle.lock().await;
        let was_playing = room.game_state.as_ref().is_some_and(|game| {
            !game.is_over() && game.turns.turn_order.contains(user_id)
        });
        let outcome = room.leave(user_id, conn);
        match &outcome {
            LeaveOutcome::Left {
                now_empty: true, ..
            } => {
                self.rooms.delete(&room_id).await;
                self.broadcaster.drop_group(&room_id).await;
            }
            LeaveOutcome::Left {
                player, new_owner, ..
            } => {
                let left = Notification::PlayerLeft {
                    room_id: room_id.clone(),
                    player_id: player.id.clone(),
                    player_name: player.name.clone(),
                    new_owner_id: new_owner.clone(),
                };
                self.broadcaster.broadcast(&room_id, &left).await;
                if let Some(state) = room.game_state.clone().filter(|_| was_playing) {
                    self.broadcaster
                        .broadcast(&room_id, &Notification::GameStateUpdate(state))
                        .await;
                }
            }
            LeaveOutcome::Detached => {
                tracing::debug!(conn_id = %conn, %room_id, "stale connection left, player kept");
            }
            LeaveOutcome::NotMember => {
                tracing::debug!(conn_id = %conn, %room_id, "connection pointed at a room it was not in");
            }
        }
        Some(outcome)
    }

    /// Starts a fresh game in the room.
    ///
    /// # Errors
    /// `RoomNotFound`, `NotOwner`, or `InsufficientPlayers`.
    pub async fn start_game(
        &self,
        conn: ConnectionId,
        req: StartGameRequest,
    ) -> Result<(), CoordinatorError> {
        let connection = self.connection(conn).await?;
        let handle = self.room_handle(&req.room_id).await?;
        let mut rng = self.request_rng().await;

        let mut room = handle.lock().await;
        let state = room.start_game(&connection.user_id, &mut rng)?.clone();
        self.broadcaster
            .broadcast(&room.id, &Notification::GameStateUpdate(state))
            .await;
        Ok(())
    }

    /// Applies one game action and tells the room.
    ///
    /// # Errors
    /// `RoomNotFound`, `GameNotActive`, `NotYourTurn`, or the rules' own
    /// `InvalidAction`.
    pub async fn game_action(
        &self,
        conn: ConnectionId,
        req: GameActionRequest,
    ) -> Result<(), CoordinatorError> {
        let connection = self.connection(conn).await?;
        let handle = self.room_handle(&req.room_id).await?;
        let mut rng = self.request_rng().await;

        let mut room = handle.lock().await;
        let outcome =
            room.apply_action(&connection.user_id, &req.action, &req.action_data, &mut rng)?;
        if let Some(state) = room.game_state.clone() {
            self.broadcaster
                .broadcast(&room.id, &Notification::GameStateUpdate(state))
                .await;
        }
        let action = Notification::GameAction {
            room_id: room.id.clone(),
            player_id: connection.user_id,
            player_name: outcome.actor_name,
            action: req.action,
            action_data: req.action_data,
            description: outcome.description,
        };
        self.broadcaster.broadcast(&room.id, &action).await;
        Ok(())
    }

    pub async fn list_rooms(&self, conn: ConnectionId) -> Result<(), CoordinatorError> {
        self.connection(conn).await?;
        let rooms = self.rooms.list().await;
        self.broadcaster
            .send_to(conn, Notification::RoomList { rooms })
            .await;
        Ok(())
    }

    pub async fn ping(&self, conn: ConnectionId, ping: Ping) -> Result<(), CoordinatorError> {
        self.connection(conn).await?;
        self.broadcaster
            .send_to(
                conn,
                Notification::Pong {
                    client_time: ping.client_time,
                    server_time: now_millis(),
                },
            )
            .await;
        Ok(())
    }

    /// Tears a connection down: leaves its room, then forgets it.
    ///
    /// Safe to call more than once and concurrently with a leave.
    pub async fn disconnect(&self, conn: ConnectionId) {
        if let Some(connection) = self.connections.get(conn).await {
            self.detach(conn, &connection.user_id).await;
            tracing::info!(conn_id = %conn, user_id = %connection.user_id, "client disconnected");
        }
        self.connections.remove(conn).await;
        self.broadcaster.unregister(conn).await;
    }

    /// Drops all rooms and connections along with their broadcast groups.
    /// Live sockets lose their outboxes and are closed by their writer
    /// tasks.
    ///
    /// Returns how many rooms and connections were cleared.
    pub async fn reset(&self) -> (usize, usize) {
        let rooms = self.rooms.clear().await;
        let connections = self.connections.clear().await;
        self.broadcaster.clear().await;
        tracing::info!(rooms, connections, "coordinator reset");
        (rooms, connections)
    }

    /// A copy of the room's current state, for inspection.
    pub async fn snapshot(&self, id: &RoomCode) -> Option<Room> {
        let handle = self.rooms.get(id).await?;
        let room = handle.lock().await;
        Some(room.clone())
    }
}

fn new_player(connection: &Connection, user_name: Option<String>, avatar: Option<Avatar>) -> NewPlayer {
    let name = user_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string());
    NewPlayer {
        id: connection.user_id.clone(),
        name,
        avatar: avatar.unwrap_or_default(),
        connection_id: connection.id,
    }
}
