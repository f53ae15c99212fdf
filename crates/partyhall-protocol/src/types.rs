//! Inbound wire types.
//!
//! Every frame a client sends is a [`ClientEvent`], adjacently tagged so the
//! JSON looks like the event names the mobile client already emits:
//!
//! ```text
//! { "event": "joinRoom", "data": { "roomId": "K3ZQ9A", "userName": "Bo" } }
//! ```

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Version a client must announce in its `hello` frame.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A user identity as issued by the authenticator.
///
/// The coordinator never invents these; it only compares and stores them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A room identifier, doubling as the invite code users share.
///
/// Codes are case-insensitive on input: whatever a user types is trimmed
/// and upper-cased before it is compared against live rooms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Milliseconds since the Unix epoch, the timestamp unit on the wire.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Shared wire data
// ---------------------------------------------------------------------------

/// How a player is drawn by the client. Opaque to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Avatar {
    pub base: String,
    pub outfit: String,
    pub drink: String,
    pub accessory: String,
}

impl Default for Avatar {
    fn default() -> Self {
        Self {
            base: "default".into(),
            outfit: "casual".into(),
            drink: "beer".into(),
            accessory: "none".into(),
        }
    }
}

/// Per-room settings chosen by the creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomSettings {
    /// Seat limit, 2..=10.
    pub max_players: usize,
    /// Stored and echoed only; spectating is not served.
    pub allow_spectators: bool,
    /// Stored and echoed to clients. Older clients call it `momMode`.
    #[serde(alias = "momMode")]
    pub family_mode: bool,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            max_players: 8,
            allow_spectators: false,
            family_mode: false,
        }
    }
}

/// Stable, machine-readable error codes carried by `error` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    RoomNotFound,
    RoomFull,
    NotOwner,
    InsufficientPlayers,
    InvalidGameType,
    GameNotActive,
    NotYourTurn,
    InvalidAction,
    InvalidConfiguration,
    /// The handshake was malformed or the identity was rejected.
    HandshakeFailed,
}

// ---------------------------------------------------------------------------
// Client events
// ---------------------------------------------------------------------------

/// Everything a client can send after (and including) the handshake.
///
/// Disconnect has no frame: it is the socket closing or going idle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// First frame on every connection.
    Hello(Hello),
    CreateRoom(CreateRoomRequest),
    JoinRoom(JoinRoomRequest),
    LeaveRoom(LeaveRoomRequest),
    StartGame(StartGameRequest),
    GameAction(GameActionRequest),
    ListRooms,
    Ping(Ping),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    pub version: u32,
    /// Identity token handed to the authenticator. `None` asks for a guest.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub name: String,
    /// Parsed by the coordinator; unknown names are a configuration error.
    pub game_type: String,
    /// Absent means private. An explicit `false` is honoured as-is.
    #[serde(default = "default_private")]
    pub is_private: bool,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<Avatar>,
    #[serde(default)]
    pub settings: Option<RoomSettings>,
}

fn default_private() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub room_id: RoomCode,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<Avatar>,
}

/// The room id is informational; the connection's current room decides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeaveRoomRequest {
    pub room_id: Option<RoomCode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameRequest {
    pub room_id: RoomCode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameActionRequest {
    pub room_id: RoomCode,
    pub action: String,
    /// Action-specific payload, validated by the game's rules.
    #[serde(default)]
    pub action_data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ping {
    pub client_time: u64,
}
