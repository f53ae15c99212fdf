//! Rooms and the live room registry for Partyhall.
//!
//! A [`Room`] holds its members and settings along with its current game. The
//! [`RoomRegistry`] owns every live room, each behind its own lock, so
//! work on one room never waits on another.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: create, look up, list, and delete rooms
//! - [`Room`]: membership, ownership transfer, game start and actions
//! - [`RoomStatus`]: `waiting`, `playing`, `paused`, `finished`
//! - [`RoomSummary`]: the listing view of a room

mod error;
mod registry;
mod room;

pub use error::RoomError;
pub use registry::{ROOM_CODE_LEN, RoomRegistry, SharedRoom};
pub use room::{
    ActionOutcome, JoinOutcome, LeaveOutcome, MAX_PLAYERS_RANGE, MIN_PLAYERS, NewPlayer, Player,
    Room, RoomStatus, RoomSummary,
};
