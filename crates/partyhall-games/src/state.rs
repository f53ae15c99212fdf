//! The game state envelope and the closed set of game types.

use std::fmt;
use std::str::FromStr;

use partyhall_protocol::UserId;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::{Bluffing, CardDraw, GameError, GameRules, PromptResponse};

/// Where a game is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Card-draw and prompt games stay here until they end.
    Playing,
    /// Bluffing: waiting for every active player to roll.
    Rolling,
    /// Bluffing: players bid or challenge.
    Bidding,
    /// Terminal. No further actions are accepted.
    GameOver,
}

/// Bookkeeping shared by every game type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnState {
    pub round: u32,
    pub phase: Phase,
    pub current_turn: Option<UserId>,
    /// Seat order of the players in the game. Turns rotate through it.
    pub turn_order: Vec<UserId>,
    pub winner: Option<UserId>,
    pub loser: Option<UserId>,
}

impl TurnState {
    fn new(turn_order: Vec<UserId>, first: Option<UserId>, phase: Phase) -> Self {
        Self {
            round: 1,
            phase,
            current_turn: first,
            turn_order,
            winner: None,
            loser: None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// The next player after `from` in seat order, wrapping, for whom
    /// `eligible` holds. `from` itself is the last candidate considered.
    pub fn next_after(&self, from: &UserId, eligible: impl Fn(&UserId) -> bool) -> Option<UserId> {
        let len = self.turn_order.len();
        let start = self.turn_order.iter().position(|p| p == from)?;
        (1..=len)
            .map(|step| &self.turn_order[(start + step) % len])
            .find(|p| eligible(p))
            .cloned()
    }

    /// Passes the turn to the next eligible player.
    pub fn advance(&mut self, eligible: impl Fn(&UserId) -> bool) {
        let next = match &self.current_turn {
            Some(current) => self.next_after(current, eligible),
            None => self.turn_order.iter().find(|p| eligible(p)).cloned(),
        };
        self.current_turn = next;
    }

    pub fn finish_with_winner(&mut self, winner: UserId) {
        self.phase = Phase::GameOver;
        self.winner = Some(winner);
    }

    pub fn finish_with_loser(&mut self, loser: UserId) {
        self.phase = Phase::GameOver;
        self.loser = Some(loser);
    }

    /// Drops `player` from the turn order, passing the turn on first if
    /// they held it.
    fn remove_player(&mut self, player: &UserId, eligible: impl Fn(&UserId) -> bool) {
        if self.current_turn.as_ref() == Some(player) {
            self.current_turn = self.next_after(player, |p| p != player && eligible(p));
        }
        self.turn_order.retain(|p| p != player);
    }
}

/// The games a room can host. The wire names are the ones clients send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameType {
    /// Draw from a shuffled deck; the fourth king loses.
    #[serde(rename = "kings-cup")]
    CardDraw,
    /// Read prompts aloud; everyone answers.
    #[serde(rename = "never-have-i-ever")]
    PromptResponse,
    /// Roll hidden dice, bid on the table total, call bluffs.
    #[serde(rename = "liars-dice")]
    Bluffing,
}

impl GameType {
    pub const ALL: [GameType; 3] = [GameType::CardDraw, GameType::PromptResponse, GameType::Bluffing];

    pub fn as_str(self) -> &'static str {
        match self {
            GameType::CardDraw => "kings-cup",
            GameType::PromptResponse => "never-have-i-ever",
            GameType::Bluffing => "liars-dice",
        }
    }

    /// Starts a fresh game of this type.
    ///
    /// `players` is the seat order; the first turn is drawn uniformly at
    /// random from it.
    pub fn start<R: Rng + ?Sized>(self, players: &[UserId], rng: &mut R) -> GameState {
        let payload = match self {
            GameType::CardDraw => GamePayload::CardDraw(CardDraw::init(players, rng)),
            GameType::PromptResponse => {
                GamePayload::PromptResponse(PromptResponse::init(players, rng))
            }
            GameType::Bluffing => GamePayload::Bluffing(Bluffing::init(players, rng)),
        };
        GameState::start(players, payload, rng)
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameType {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| GameError::InvalidGameType(s.to_string()))
    }
}

/// Variant-specific game data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "gameType")]
pub enum GamePayload {
    #[serde(rename = "kings-cup")]
    CardDraw(CardDraw),
    #[serde(rename = "never-have-i-ever")]
    PromptResponse(PromptResponse),
    #[serde(rename = "liars-dice")]
    Bluffing(Bluffing),
}

impl From<CardDraw> for GamePayload {
    fn from(payload: CardDraw) -> Self {
        GamePayload::CardDraw(payload)
    }
}

impl From<PromptResponse> for GamePayload {
    fn from(payload: PromptResponse) -> Self {
        GamePayload::PromptResponse(payload)
    }
}

impl From<Bluffing> for GamePayload {
    fn from(payload: Bluffing) -> Self {
        GamePayload::Bluffing(payload)
    }
}

/// Runs `$body` with `$rules` bound to the payload's concrete rules type.
macro_rules! dispatch {
    ($payload:expr, $rules:ident => $body:expr) => {
        match $payload {
            GamePayload::CardDraw($rules) => $body,
            GamePayload::PromptResponse($rules) => $body,
            GamePayload::Bluffing($rules) => $body,
        }
    };
}

/// A running (or finished) game: shared bookkeeping plus the variant data.
///
/// Serializes flat, e.g.
/// `{"round":1,"phase":"playing","currentTurn":"alice",...,"gameType":"kings-cup","cardsRemaining":52,...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameState {
    #[serde(flatten)]
    pub turns: TurnState,
    #[serde(flatten)]
    pub payload: GamePayload,
}

impl GameState {
    /// Wraps an already-built payload into a fresh game.
    ///
    /// Useful for games seeded with custom content, such as a prompt game
    /// with a caller-chosen prompt list.
    pub fn start<R: Rng + ?Sized>(
        players: &[UserId],
        payload: impl Into<GamePayload>,
        rng: &mut R,
    ) -> Self {
        let payload = payload.into();
        let phase = match &payload {
            GamePayload::CardDraw(_) => CardDraw::initial_phase(),
            GamePayload::PromptResponse(_) => PromptResponse::initial_phase(),
            GamePayload::Bluffing(_) => Bluffing::initial_phase(),
        };
        let first = players.choose(rng).cloned();
        Self {
            turns: TurnState::new(players.to_vec(), first, phase),
            payload,
        }
    }

    pub fn game_type(&self) -> GameType {
        match self.payload {
            GamePayload::CardDraw(_) => GameType::CardDraw,
            GamePayload::PromptResponse(_) => GameType::PromptResponse,
            GamePayload::Bluffing(_) => GameType::Bluffing,
        }
    }

    pub fn is_over(&self) -> bool {
        self.turns.is_over()
    }

    pub fn current_turn(&self) -> Option<&UserId> {
        self.turns.current_turn.as_ref()
    }

    /// Returns `true` if any player may send `action`, turn or not.
    pub fn is_turn_exempt(&self, action: &str) -> bool {
        match self.payload {
            GamePayload::CardDraw(_) => CardDraw::is_turn_exempt(action),
            GamePayload::PromptResponse(_) => PromptResponse::is_turn_exempt(action),
            GamePayload::Bluffing(_) => Bluffing::is_turn_exempt(action),
        }
    }

    /// Applies an action and returns the resulting state.
    ///
    /// `self` is left untouched, so a rejected action costs nothing.
    ///
    /// # Errors
    /// `GameError::InvalidAction` if the game is over or the rules reject
    /// the action.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        action: &str,
        data: &Value,
        actor: &UserId,
        rng: &mut R,
    ) -> Result<GameState, GameError> {
        if self.is_over() {
            return Err(GameError::InvalidAction("the game is over".into()));
        }
        let mut next = self.clone();
        let turns = &mut next.turns;
        dispatch!(&mut next.payload, rules => rules.apply(turns, action, data, actor, rng))?;
        tracing::debug!(%actor, action, phase = ?next.turns.phase, "game action applied");
        Ok(next)
    }

    /// Human-readable line for the `gameAction` notification.
    pub fn describe(&self, action: &str, data: &Value, actor_name: &str) -> String {
        dispatch!(&self.payload, rules => rules.describe(&self.turns, action, data, actor_name))
    }

    /// Removes a departing player from the game, passing on their turn.
    pub fn remove_player(&mut self, player: &UserId) {
        let turns = &mut self.turns;
        dispatch!(&mut self.payload, rules => {
            rules.on_player_left(turns, player);
            turns.remove_player(player, |p| rules.is_eligible(p));
        });
    }
}

/// Serializes a sequence as its length. Keeps hidden piles (deck, prompt
/// queue) off the wire while still telling clients how much is left.
pub(crate) fn serialize_len<S, T>(items: &[T], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(items.len() as u64)
}
