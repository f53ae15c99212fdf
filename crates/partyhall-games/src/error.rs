//! Error types for the game layer.

/// Errors that game rules can produce.
///
/// A rejected action never changes state: rules run against a copy of the
/// game and the copy is discarded on error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The game type name didn't match any known game.
    #[error("unknown game type: {0}")]
    InvalidGameType(String),

    /// The action name is unknown for this game, its payload is malformed,
    /// or it isn't allowed in the current phase.
    #[error("invalid action: {0}")]
    InvalidAction(String),
}

impl GameError {
    pub(crate) fn unknown_action(action: &str) -> Self {
        Self::InvalidAction(format!("unknown action '{action}'"))
    }
}
