//! Connection tracking for Partyhall.
//!
//! This crate knows who is on the other end of each live connection:
//!
//! 1. **Identity**: turning a handshake token into a [`UserId`](partyhall_protocol::UserId)
//!    ([`Authenticator`] trait, [`GuestAuthenticator`] default)
//! 2. **Connection tracking**: which user each connection speaks for and
//!    which room it is attached to ([`ConnectionRegistry`])
//!
//! ```text
//! Coordinator (above)  ← asks "who is conn-7, and where are they?"
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol Layer (below)  ← provides UserId, RoomCode, ConnectionId
//! ```

mod auth;
mod error;
mod registry;

pub use auth::{Authenticator, GUEST_PREFIX, GuestAuthenticator};
pub use error::SessionError;
pub use registry::{Connection, ConnectionRegistry};
