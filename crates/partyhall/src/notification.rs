//! Outbound events: everything the server sends to clients.
//!
//! Same framing as inbound events, `{"event": "...", "data": ...}`.

use partyhall_games::GameState;
use partyhall_protocol::{ConnectionId, ErrorCode, RoomCode, UserId};
use partyhall_room::{Player, Room, RoomSummary};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Notification {
    /// Handshake accepted.
    Welcome {
        user_id: UserId,
        connection_id: ConnectionId,
        protocol_version: u32,
        server_time: u64,
    },

    /// Full snapshot of a room the requester just created.
    RoomCreated(Room),

    /// Full snapshot of a room the requester just joined or rejoined.
    RoomJoined(Room),

    /// A new member took a seat.
    PlayerJoined(Player),

    /// A member left.
    PlayerLeft {
        room_id: RoomCode,
        player_id: UserId,
        player_name: String,
        /// Present when the leaver owned the room.
        #[serde(skip_serializing_if = "Option::is_none")]
        new_owner_id: Option<UserId>,
    },

    /// The complete game state after a start or an accepted action.
    GameStateUpdate(GameState),

    /// A human-readable account of an accepted action.
    GameAction {
        room_id: RoomCode,
        player_id: UserId,
        player_name: String,
        action: String,
        action_data: Value,
        description: String,
    },

    RoomList {
        rooms: Vec<RoomSummary>,
    },

    Pong {
        client_time: u64,
        server_time: u64,
    },

    /// A request failed. Only the requester receives this.
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl Notification {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Notification::Error {
            code,
            message: message.into(),
        }
    }

    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Notification::Welcome { .. } => "welcome",
            Notification::RoomCreated(_) => "roomCreated",
            Notification::RoomJoined(_) => "roomJoined",
            Notification::PlayerJoined(_) => "playerJoined",
            Notification::PlayerLeft { .. } => "playerLeft",
            Notification::GameStateUpdate(_) => "gameStateUpdate",
            Notification::GameAction { .. } => "gameAction",
            Notification::RoomList { .. } => "roomList",
            Notification::Pong { .. } => "pong",
            Notification::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_shape() {
        let json = serde_json::to_value(Notification::error(ErrorCode::RoomFull, "room is full"))
            .unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["data"]["code"], "ROOM_FULL");
        assert_eq!(json["data"]["message"], "room is full");
    }

    #[test]
    fn test_player_left_fields_are_camel_case() {
        let json = serde_json::to_value(Notification::PlayerLeft {
            room_id: RoomCode::new("ABCDEF"),
            player_id: UserId::new("bob"),
            player_name: "Bob".into(),
            new_owner_id: None,
        })
        .unwrap();
        assert_eq!(json["event"], "playerLeft");
        assert_eq!(json["data"]["playerId"], "bob");
        assert_eq!(json["data"]["roomId"], "ABCDEF");
        assert!(json["data"].get("newOwnerId").is_none());
    }

    #[test]
    fn test_name_matches_wire_tag() {
        let pong = Notification::Pong {
            client_time: 1,
            server_time: 2,
        };
        let json = serde_json::to_value(&pong).unwrap();
        assert_eq!(json["event"], pong.name());
        assert_eq!(json["data"]["clientTime"], 1);
    }
}
