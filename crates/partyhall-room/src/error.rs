//! Error types for the room layer.

use partyhall_games::GameError;
use partyhall_protocol::{ErrorCode, RoomCode, UserId};

/// Errors that can occur during room operations.
///
/// Every variant is request-scoped: it is reported to the client that
/// asked and leaves the room as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (or was just emptied and is being removed).
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// Every seat is taken.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// Only the owner may do this.
    #[error("only the room owner can do that")]
    NotOwner(UserId),

    /// The user is not a member of this room.
    #[error("player {0} is not in room {1}")]
    NotInRoom(UserId, RoomCode),

    /// Not enough players to start a game.
    #[error("need at least {needed} players to start, have {have}")]
    InsufficientPlayers { needed: usize, have: usize },

    /// No game is running in this room.
    #[error("no game is in progress in room {0}")]
    GameNotActive(RoomCode),

    /// Someone else holds the turn.
    #[error("it's not {0}'s turn")]
    NotYourTurn(UserId),

    /// Room settings or game type were rejected at creation.
    #[error("invalid room configuration: {0}")]
    InvalidConfiguration(String),

    /// The game rules rejected the action.
    #[error(transparent)]
    Game(#[from] GameError),
}

impl RoomError {
    /// The stable code sent to clients in `error` frames.
    pub fn code(&self) -> ErrorCode {
        match self {
            RoomError::NotFound(_) => ErrorCode::RoomNotFound,
            RoomError::RoomFull(_) => ErrorCode::RoomFull,
            RoomError::NotOwner(_) => ErrorCode::NotOwner,
            RoomError::NotInRoom(..) => ErrorCode::InvalidAction,
            RoomError::InsufficientPlayers { .. } => ErrorCode::InsufficientPlayers,
            RoomError::GameNotActive(_) => ErrorCode::GameNotActive,
            RoomError::NotYourTurn(_) => ErrorCode::NotYourTurn,
            RoomError::InvalidConfiguration(_) => ErrorCode::InvalidConfiguration,
            RoomError::Game(GameError::InvalidAction(_)) => ErrorCode::InvalidAction,
            RoomError::Game(GameError::InvalidGameType(_)) => ErrorCode::InvalidGameType,
        }
    }
}
