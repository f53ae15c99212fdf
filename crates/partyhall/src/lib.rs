//! # Partyhall
//!
//! Real-time coordinator for turn-based party games.
//!
//! Clients connect over WebSocket, say `hello`, and then create or join
//! rooms of 2 to 10 players. The room owner starts one of three games; from
//! then on every accepted action is applied under the room's lock and the
//! new state is broadcast to every member in order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use partyhall::prelude::*;
//!
//! # async fn run() -> Result<(), PartyhallError> {
//! let server = PartyhallServer::<GuestAuthenticator, _>::builder()
//!     .bind("0.0.0.0:3001")
//!     .build(GuestAuthenticator)
//!     .await?;
//! server.run().await
//! # }
//! ```

pub mod admin;
pub mod broadcast;
mod config;
mod coordinator;
mod error;
mod handler;
pub mod logging;
mod notification;
mod server;

pub use config::ServerConfig;
pub use coordinator::{DEFAULT_PLAYER_NAME, SessionCoordinator};
pub use error::{CoordinatorError, PartyhallError};
pub use notification::Notification;
pub use server::{PartyhallServer, PartyhallServerBuilder};

/// The types most servers and tests need.
pub mod prelude {
    pub use crate::{
        CoordinatorError, Notification, PartyhallError, PartyhallServer, PartyhallServerBuilder,
        ServerConfig, SessionCoordinator,
    };
    pub use partyhall_games::{GameState, GameType, Phase};
    pub use partyhall_protocol::{ClientEvent, ConnectionId, ErrorCode, RoomCode, UserId};
    pub use partyhall_room::{Player, Room, RoomRegistry, RoomStatus, RoomSummary};
    pub use partyhall_session::{Authenticator, ConnectionRegistry, GuestAuthenticator};
}
