//! A single room: who is in it and what they are playing.
//!
//! `Room` has no locking of its own. The registry keeps each room behind
//! its own mutex, and every method here runs under that lock.

use std::collections::BTreeMap;

use partyhall_games::{GameState, GameType};
use partyhall_protocol::{Avatar, ConnectionId, RoomCode, RoomSettings, UserId, now_millis};
use rand::Rng;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::RoomError;

/// Players needed before the owner can start a game.
pub const MIN_PLAYERS: usize = 2;

/// Seat limit bounds accepted at room creation.
pub const MAX_PLAYERS_RANGE: std::ops::RangeInclusive<usize> = 2..=10;

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Waiting → Playing → Finished
///              ↓
///            Paused
/// ```
///
/// Starting a new game from any state but `Playing` goes straight back to
/// `Playing` with fresh game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Paused,
    Finished,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Who is joining: identity plus how they want to appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlayer {
    pub id: UserId,
    pub name: String,
    pub avatar: Avatar,
    pub connection_id: ConnectionId,
}

/// A member of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: UserId,
    pub name: String,
    pub avatar: Avatar,
    pub is_owner: bool,
    pub is_ready: bool,
    pub joined_at: u64,
    /// Join order within the room. Lower seats joined earlier.
    pub seat: u32,
    /// The connection currently speaking for this player.
    #[serde(skip)]
    pub connection_id: ConnectionId,
}

/// What `Room::join` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A new seat was taken.
    Joined,
    /// An existing member came back on a new connection.
    Reconnected,
}

/// What `Room::leave` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The player was removed.
    Left {
        player: Player,
        /// Set when ownership moved because the owner left.
        new_owner: Option<UserId>,
        /// No players remain; the caller should delete the room.
        now_empty: bool,
    },
    /// The connection no longer speaks for the player (they reconnected
    /// elsewhere), so only the connection is detached.
    Detached,
    /// The user was not a member.
    NotMember,
}

/// Result of an accepted game action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub actor_name: String,
    pub description: String,
    /// The action ended the game.
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One live room. Serializes to the full snapshot clients receive.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomCode,
    pub name: String,
    pub game_type: GameType,
    pub owner_id: UserId,
    pub is_private: bool,
    pub settings: RoomSettings,
    pub status: RoomStatus,
    #[serde(serialize_with = "players_by_seat")]
    players: BTreeMap<UserId, Player>,
    pub game_state: Option<GameState>,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(skip)]
    next_seat: u32,
}

impl Room {
    pub(crate) fn new(
        id: RoomCode,
        name: String,
        game_type: GameType,
        settings: RoomSettings,
        is_private: bool,
        owner: NewPlayer,
    ) -> Self {
        let now = now_millis();
        let owner_id = owner.id.clone();
        let mut room = Self {
            id,
            name,
            game_type,
            owner_id,
            is_private,
            settings,
            status: RoomStatus::Waiting,
            players: BTreeMap::new(),
            game_state: None,
            created_at: now,
            updated_at: now,
            next_seat: 0,
        };
        room.seat(owner, true);
        room
    }

    fn seat(&mut self, new: NewPlayer, is_owner: bool) {
        let player = Player {
            id: new.id.clone(),
            name: new.name,
            avatar: new.avatar,
            is_owner,
            is_ready: false,
            joined_at: now_millis(),
            seat: self.next_seat,
            connection_id: new.connection_id,
        };
        self.next_seat += 1;
        self.players.insert(new.id, player);
    }

    fn touch(&mut self) {
        self.updated_at = now_millis();
    }

    pub fn player(&self, id: &UserId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn is_member(&self, id: &UserId) -> bool {
        self.players.contains_key(id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.settings.max_players
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Members in seat order.
    pub fn players(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|p| p.seat);
        players
    }

    /// Checks whether `user` could join right now, without changing anything.
    ///
    /// # Errors
    /// `NotFound` if the room has already been emptied, `RoomFull` if a new
    /// member would exceed the seat limit.
    ///
    /// Membership is checked before the seat limit on purpose: a member
    /// reconnecting to a full room rebinds their seat instead of being
    /// turned away by `RoomFull`.
    pub fn check_join(&self, user: &UserId) -> Result<JoinOutcome, RoomError> {
        if self.is_empty() {
            return Err(RoomError::NotFound(self.id.clone()));
        }
        if self.is_member(user) {
            return Ok(JoinOutcome::Reconnected);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull(self.id.clone()));
        }
        Ok(JoinOutcome::Joined)
    }

    /// Adds a player, or re-binds an existing member to a new connection.
    ///
    /// # Errors
    /// See [`Room::check_join`].
    pub fn join(&mut self, new: NewPlayer) -> Result<JoinOutcome, RoomError> {
        let outcome = self.check_join(&new.id)?;
        match outcome {
            JoinOutcome::Reconnected => {
                if let Some(player) = self.players.get_mut(&new.id) {
                    player.connection_id = new.connection_id;
                }
                tracing::info!(room_id = %self.id, user_id = %new.id, "player reconnected");
            }
            JoinOutcome::Joined => {
                tracing::info!(room_id = %self.id, user_id = %new.id, "player joined");
                self.seat(new, false);
            }
        }
        self.touch();
        Ok(outcome)
    }

    /// Removes `user` if `connection` still speaks for them.
    ///
    /// Ownership passes to the remaining player with the lowest seat. A
    /// running game drops the player from its turn order.
    pub fn leave(&mut self, user: &UserId, connection: ConnectionId) -> LeaveOutcome {
        match self.players.get(user) {
            None => return LeaveOutcome::NotMember,
            Some(player) if player.connection_id != connection => {
                return LeaveOutcome::Detached;
            }
            Some(_) => {}
        }
        let Some(player) = self.players.remove(user) else {
            return LeaveOutcome::NotMember;
        };
        tracing::info!(room_id = %self.id, user_id = %user, "player left");

        if let Some(game) = self.game_state.as_mut() {
            if !game.is_over() {
                game.remove_player(user);
                if game.is_over() && self.status == RoomStatus::Playing {
                    self.status = RoomStatus::Finished;
                }
            }
        }

        let mut new_owner = None;
        if self.owner_id == *user {
            if let Some(next) = self.players.values_mut().min_by_key(|p| p.seat) {
                next.is_owner = true;
                self.owner_id = next.id.clone();
                new_owner = Some(next.id.clone());
                tracing::info!(room_id = %self.id, new_owner = %next.id, "ownership transferred");
            }
        }
        self.touch();

        LeaveOutcome::Left {
            player,
            new_owner,
            now_empty: self.players.is_empty(),
        }
    }

    /// Starts a fresh game. Any previous game state is discarded.
    ///
    /// # Errors
    /// `NotOwner` unless `requester` owns the room; `InsufficientPlayers`
    /// below two members.
    pub fn start_game<R: Rng + ?Sized>(
        &mut self,
        requester: &UserId,
        rng: &mut R,
    ) -> Result<&GameState, RoomError> {
        if *requester != self.owner_id {
            return Err(RoomError::NotOwner(requester.clone()));
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(RoomError::InsufficientPlayers {
                needed: MIN_PLAYERS,
                have: self.players.len(),
            });
        }
        let seats: Vec<UserId> = self.players().into_iter().map(|p| p.id.clone()).collect();
        let state = self.game_type.start(&seats, rng);
        self.status = RoomStatus::Playing;
        self.touch();
        tracing::info!(room_id = %self.id, game_type = %self.game_type, "game started");
        Ok(&*self.game_state.insert(state))
    }

    /// Applies a game action by `actor`.
    ///
    /// The new state replaces the old one only if the rules accept it.
    ///
    /// # Errors
    /// `GameNotActive` outside `Playing`, `NotInRoom` for non-members,
    /// `NotYourTurn` for turn-gated actions out of turn, or the rules'
    /// own `InvalidAction`.
    pub fn apply_action<R: Rng + ?Sized>(
        &mut self,
        actor: &UserId,
        action: &str,
        data: &Value,
        rng: &mut R,
    ) -> Result<ActionOutcome, RoomError> {
        if self.status != RoomStatus::Playing {
            return Err(RoomError::GameNotActive(self.id.clone()));
        }
        let game = self
            .game_state
            .as_ref()
            .ok_or_else(|| RoomError::GameNotActive(self.id.clone()))?;
        let actor_name = self
            .players
            .get(actor)
            .map(|p| p.name.clone())
            .ok_or_else(|| RoomError::NotInRoom(actor.clone(), self.id.clone()))?;
        if !game.is_turn_exempt(action) && game.current_turn() != Some(actor) {
            return Err(RoomError::NotYourTurn(actor.clone()));
        }

        let next = game.apply(action, data, actor, rng)?;
        let description = next.describe(action, data, &actor_name);
        let finished = next.is_over();
        self.game_state = Some(next);
        if finished {
            self.status = RoomStatus::Finished;
            tracing::info!(room_id = %self.id, "game finished");
        }
        self.touch();

        Ok(ActionOutcome {
            actor_name,
            description,
            finished,
        })
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            game_type: self.game_type,
            player_count: self.players.len(),
            max_players: self.settings.max_players,
            status: self.status,
            is_private: self.is_private,
        }
    }
}

fn players_by_seat<S: Serializer>(
    players: &BTreeMap<UserId, Player>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut seated: Vec<&Player> = players.values().collect();
    seated.sort_by_key(|p| p.seat);
    serializer.collect_seq(seated)
}

/// The listing view of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomCode,
    pub name: String,
    pub game_type: GameType,
    pub player_count: usize,
    pub max_players: usize,
    pub status: RoomStatus,
    pub is_private: bool,
}
