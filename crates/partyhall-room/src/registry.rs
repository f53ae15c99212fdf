//! The set of live rooms.

use std::collections::HashMap;
use std::sync::Arc;

use partyhall_games::GameType;
use partyhall_protocol::{RoomCode, RoomSettings};
use rand::Rng;
use tokio::sync::Mutex;

use crate::room::MAX_PLAYERS_RANGE;
use crate::{NewPlayer, Room, RoomError, RoomSummary};

/// Length of generated room codes.
pub const ROOM_CODE_LEN: usize = 6;

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A room behind its own lock. Holding the lock is the only way to touch
/// the room, so mutations of one room are serialized while different
/// rooms proceed independently.
pub type SharedRoom = Arc<Mutex<Room>>;

/// Owns every live room, keyed by code.
///
/// The map lock is only held while a handle is looked up or changed; callers
/// lock the room itself after the map lock is released. Nothing here ever
/// awaits a room lock while holding the map.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomCode, SharedRoom>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a room with `owner` as its only player and returns it.
    ///
    /// The code is random and checked against live rooms; on a collision a
    /// new one is drawn.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `settings.max_players` is outside 2..=10.
    pub async fn create_room<R: Rng + ?Sized>(
        &self,
        owner: NewPlayer,
        name: String,
        game_type: GameType,
        settings: RoomSettings,
        is_private: bool,
        rng: &mut R,
    ) -> Result<SharedRoom, RoomError> {
        if !MAX_PLAYERS_RANGE.contains(&settings.max_players) {
            return Err(RoomError::InvalidConfiguration(format!(
                "maxPlayers must be between {} and {}, got {}",
                MAX_PLAYERS_RANGE.start(),
                MAX_PLAYERS_RANGE.end(),
                settings.max_players
            )));
        }

        let mut rooms = self.rooms.lock().await;
        let code = loop {
            let candidate = generate_code(rng);
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
            tracing::debug!(%candidate, "room code collision, regenerating");
        };

        let room = Room::new(code.clone(), name, game_type, settings, is_private, owner);
        let handle = Arc::new(Mutex::new(room));
        rooms.insert(code.clone(), Arc::clone(&handle));
        tracing::info!(room_id = %code, %game_type, "room created");
        Ok(handle)
    }

    pub async fn get(&self, id: &RoomCode) -> Option<SharedRoom> {
        self.rooms.lock().await.get(id).cloned()
    }

    /// Removes a room. Returns `false` if it was already gone.
    pub async fn delete(&self, id: &RoomCode) -> bool {
        let removed = self.rooms.lock().await.remove(id).is_some();
        if removed {
            tracing::info!(room_id = %id, "room deleted");
        }
        removed
    }

    /// Cloned handles to every room, taken without holding the map lock
    /// afterwards.
    pub async fn handles(&self) -> Vec<SharedRoom> {
        self.rooms.lock().await.values().cloned().collect()
    }

    /// Summaries of all live rooms, oldest first.
    pub async fn list(&self) -> Vec<RoomSummary> {
        let handles = self.handles().await;
        let mut rooms = Vec::with_capacity(handles.len());
        for handle in handles {
            let room = handle.lock().await;
            if !room.is_empty() {
                rooms.push((room.created_at, room.summary()));
            }
        }
        rooms.sort_by(|(a_time, a), (b_time, b)| a_time.cmp(b_time).then_with(|| a.id.cmp(&b.id)));
        rooms.into_iter().map(|(_, summary)| summary).collect()
    }

    pub async fn len(&self) -> usize {
        self.rooms.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.lock().await.is_empty()
    }

    /// Drops every room. Returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut rooms = self.rooms.lock().await;
        let count = rooms.len();
        rooms.clear();
        tracing::info!(count, "all rooms cleared");
        count
    }
}

fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    let code: String = (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect();
    RoomCode::new(code)
}
