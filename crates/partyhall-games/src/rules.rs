//! The `GameRules` trait, the one seam every game type implements.
//!
//! Rules are pure: no I/O, no clocks they can't do without, no shared
//! state. Randomness comes in as an explicit `rng` argument so a seeded
//! generator gives a reproducible game.

use partyhall_protocol::UserId;
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::{GameError, Phase, TurnState};

/// Rules for one game type. The implementing type is the game's payload.
///
/// The shared bookkeeping (round, phase, whose turn, winner, loser) lives in
/// [`TurnState`] and is handed to every hook alongside the payload.
pub trait GameRules: Clone + Serialize + Sized {
    /// Builds the payload for a fresh game between `players`.
    fn init<R: Rng + ?Sized>(players: &[UserId], rng: &mut R) -> Self;

    /// The phase a fresh game starts in.
    fn initial_phase() -> Phase {
        Phase::Playing
    }

    /// Applies one action by `actor`.
    ///
    /// The caller has already checked that the game is running and that the
    /// actor may act (holds the turn, or the action is turn-exempt).
    ///
    /// # Errors
    /// Returns `GameError::InvalidAction` for unknown actions, malformed
    /// payloads, or actions not allowed in the current phase.
    fn apply<R: Rng + ?Sized>(
        &mut self,
        turns: &mut TurnState,
        action: &str,
        data: &Value,
        actor: &UserId,
        rng: &mut R,
    ) -> Result<(), GameError>;

    /// Returns `true` if `action` may be sent by any player, not just the
    /// one holding the turn. Default: every action is turn-gated.
    fn is_turn_exempt(_action: &str) -> bool {
        false
    }

    /// Returns `true` if `player` can still take turns. Default: everyone.
    fn is_eligible(&self, _player: &UserId) -> bool {
        true
    }

    /// Renders a one-line, human-readable account of an applied action.
    ///
    /// Called on the state *after* the action was applied.
    fn describe(&self, turns: &TurnState, action: &str, data: &Value, actor_name: &str) -> String;

    /// Called when a player leaves mid-game, before they are dropped from
    /// the turn order. Default: no-op.
    fn on_player_left(&mut self, _turns: &mut TurnState, _player: &UserId) {}
}
