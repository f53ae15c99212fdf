//! Wire protocol for Partyhall.
//!
//! This crate defines the "language" clients speak to the coordinator:
//!
//! - **Identity types** ([`UserId`], [`RoomCode`], [`ConnectionId`])
//! - **Client events** ([`ClientEvent`] and its request payloads)
//! - **Shared wire data** ([`Avatar`], [`RoomSettings`], [`ErrorCode`])
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): frames to/from bytes
//! - **Errors** ([`ProtocolError`])
//!
//! The protocol layer doesn't know about rooms or games; it only knows how
//! inbound frames are shaped and how to turn values into bytes.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientEvent) → Coordinator (rooms, games)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use partyhall_transport::ConnectionId;
pub use types::{
    Avatar, ClientEvent, CreateRoomRequest, ErrorCode, GameActionRequest, Hello,
    JoinRoomRequest, LeaveRoomRequest, PROTOCOL_VERSION, Ping, RoomCode, RoomSettings,
    StartGameRequest, UserId, now_millis,
};
