//! Identity and room types that appear inside events.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomId
// ---------------------------------------------------------------------------

/// A unique identifier for a room.
///
/// Rooms are addressed by clients directly (a room link is shared out of
/// band), so ids are unguessable 128-bit random tokens rendered as 32
/// lowercase hex characters. The room layer generates them; this crate
/// only carries them.
///
/// Serialized as a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Side / Role
// ---------------------------------------------------------------------------

/// One of the two player slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Moves first. The room creator always takes this slot.
    White,
    /// Moves second.
    Black,
}

impl Side {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => f.write_str("white"),
            Self::Black => f.write_str("black"),
        }
    }
}

/// The role a connection was given when it joined a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Holds the white slot.
    White,
    /// Holds the black slot.
    Black,
    /// Watches the game. Can't move.
    Spectator,
}

impl From<Side> for Role {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Self::White,
            Side::Black => Self::Black,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => f.write_str("white"),
            Self::Black => f.write_str("black"),
            Self::Spectator => f.write_str("spectator"),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Forming ⇄ Active → Finished
///    └────────┴─────────┴──→ Closed
/// ```
///
/// - **Forming**: fewer than two players seated.
/// - **Active**: both slots filled, game in progress.
/// - **Finished**: the game reached checkmate or a draw. Members stay
///   until they leave or someone closes the room.
/// - **Closed**: removed from the store. Terminal; no event for this
///   room id succeeds afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    /// Waiting for the second player.
    Forming,
    /// Both players seated, game in progress.
    Active,
    /// The game is over.
    Finished,
    /// The room is gone.
    Closed,
}

impl RoomState {
    /// Returns `true` while moves may still be submitted.
    pub fn accepts_moves(self) -> bool {
        matches!(self, Self::Forming | Self::Active)
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forming => f.write_str("forming"),
            Self::Active => f.write_str("active"),
            Self::Finished => f.write_str("finished"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// A room member as other clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    /// The member's connection id.
    pub id: u64,
    /// The member's declared display name.
    pub name: String,
}

/// Everything a client needs to render a room it just joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    /// The room's id.
    pub room_id: RoomId,
    /// Lifecycle state at snapshot time.
    pub state: RoomState,
    /// The white player, if seated.
    pub white: Option<ParticipantInfo>,
    /// The black player, if seated.
    pub black: Option<ParticipantInfo>,
    /// Spectators in join order.
    pub spectators: Vec<ParticipantInfo>,
    /// The position, in the game's own notation (FEN for chess).
    pub board: String,
    /// Whose move it is.
    pub turn: Side,
}

// ---------------------------------------------------------------------------
// Outcome / error codes
// ---------------------------------------------------------------------------

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOverReason {
    /// The mover delivered mate.
    Checkmate,
    /// Stalemate, repetition, insufficient material, and the like.
    Draw,
}

/// Machine-readable error kinds sent back to the requesting client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    /// No room with that id exists (or it was already closed).
    RoomNotFound,
    /// The display name is already used by someone in the room.
    NameConflict,
    /// The requester holds neither player slot.
    NotAPlayer,
    /// The requester's side is not the side to move.
    NotYourTurn,
    /// The game rules rejected the move.
    InvalidMove,
    /// The requester is not seated in the room.
    NotAMember,
}
