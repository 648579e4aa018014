//! Room configuration.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ClosePolicy
// ---------------------------------------------------------------------------

/// Who may close a room with an explicit close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClosePolicy {
    /// Any connection that knows the room id. Room ids are unguessable
    /// tokens, but nothing ties the request to a seat in the room.
    #[default]
    Anyone,

    /// Only a connection seated in the room (player or spectator).
    MembersOnly,
}

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room a [`RoomManager`](crate::RoomManager)
/// creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomConfig {
    /// A room closes as soon as a departure leaves fewer seated players
    /// than this. Clamped to `1..=2`.
    ///
    /// The default of 2 means rooms never run single-player: either
    /// player leaving ends the room.
    pub min_players: usize,

    /// Capacity of each room actor's command queue. Senders wait when it
    /// is full.
    pub channel_size: usize,

    /// Authorization rule for explicit close requests.
    pub close_policy: ClosePolicy,
}

impl RoomConfig {
    /// Returns `min_players` clamped to the two seats a room has.
    pub fn effective_min_players(&self) -> usize {
        self.min_players.clamp(1, 2)
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            channel_size: 64,
            close_policy: ClosePolicy::Anyone,
        }
    }
}
