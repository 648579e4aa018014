//! Error types for the room layer.

use kingside_protocol::{ErrorCode, RoomId, Side};
use kingside_transport::ConnectionId;

/// Errors that can occur during room operations.
///
/// Every variant is recoverable and goes back to the requesting
/// connection only. A request that fails leaves the room untouched.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist, or it has already closed.
    #[error("room {0} does not exist")]
    NotFound(RoomId),

    /// Someone in the room already uses this display name.
    #[error("name {name:?} is already taken in room {room_id}")]
    NameConflict { name: String, room_id: RoomId },

    /// The connection holds neither player slot.
    #[error("{0} is not a player in room {1}")]
    NotAPlayer(ConnectionId, RoomId),

    /// The connection's side is not the side to move.
    #[error("not your turn, {to_move} to move")]
    NotYourTurn { to_move: Side },

    /// The game rules rejected the move, or the game is already over.
    #[error("invalid move: {0}")]
    InvalidMove(String),

    /// The close policy requires a seat in the room.
    #[error("{0} is not a member of room {1}")]
    NotAMember(ConnectionId, RoomId),
}

impl RoomError {
    /// The wire code reported to the client.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::RoomNotFound,
            Self::NameConflict { .. } => ErrorCode::NameConflict,
            Self::NotAPlayer(..) => ErrorCode::NotAPlayer,
            Self::NotYourTurn { .. } => ErrorCode::NotYourTurn,
            Self::InvalidMove(_) => ErrorCode::InvalidMove,
            Self::NotAMember(..) => ErrorCode::NotAMember,
        }
    }
}
