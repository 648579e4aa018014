//! Room store: the index of live rooms by id.

use std::collections::HashMap;
use std::sync::Arc;

use kingside_protocol::RoomId;
use rand::Rng;
use tokio::sync::Mutex;

use crate::actor::{RoomHandle, spawn_room};
use crate::room::{Member, Room};
use crate::{Gateway, GameRules, RoomConfig, RoomError};

/// Maps room ids to running room actors.
///
/// The lock only guards the map. Callers clone a handle out and talk to
/// the room after the lock is released, so a slow room never blocks
/// lookups of other rooms.
pub struct RoomStore<G: GameRules> {
    rooms: Mutex<HashMap<RoomId, RoomHandle<G>>>,
    config: RoomConfig,
    gateway: Arc<Gateway>,
}

impl<G: GameRules> RoomStore<G> {
    /// Creates an empty store. Rooms it creates share `config` and
    /// broadcast through `gateway`.
    pub fn new(config: RoomConfig, gateway: Arc<Gateway>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            config,
            gateway,
        }
    }

    /// Creates a room with `creator` seated as white and returns its id.
    ///
    /// The id is drawn fresh until it misses every live room.
    pub async fn create(&self, creator: Member) -> RoomId {
        let mut rooms = self.rooms.lock().await;
        let room_id = loop {
            let candidate = generate_room_id();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let room = Room::<G>::new(
            room_id.clone(),
            creator,
            self.config.clone(),
            Arc::clone(&self.gateway),
        );
        rooms.insert(room_id.clone(), spawn_room(room, self.config.channel_size));
        room_id
    }

    /// Looks up a room.
    pub async fn get(&self, room_id: &RoomId) -> Result<RoomHandle<G>, RoomError> {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    /// Removes a room. Returns `true` if it was present; deleting an
    /// already-deleted room is a no-op.
    pub async fn delete(&self, room_id: &RoomId) -> bool {
        self.rooms.lock().await.remove(room_id).is_some()
    }

    /// Handles to every live room.
    pub async fn handles(&self) -> Vec<RoomHandle<G>> {
        self.rooms.lock().await.values().cloned().collect()
    }

    /// Ids of every live room.
    pub async fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.lock().await.keys().cloned().collect()
    }

    /// Number of live rooms.
    pub async fn len(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Returns `true` when no rooms are live.
    pub async fn is_empty(&self) -> bool {
        self.rooms.lock().await.is_empty()
    }
}

/// Generates a random 32-character hex room id (128 bits of entropy), so
/// ids can't be guessed or enumerated.
fn generate_room_id() -> RoomId {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    RoomId::new(bytes.iter().map(|b| format!("{b:02x}")).collect::<String>())
}
