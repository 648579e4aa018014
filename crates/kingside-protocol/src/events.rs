//! Events and the envelope they travel in.
//!
//! JSON shapes (all keys camelCase):
//!
//! ```text
//! {"seq": 4, "timestamp": 0, "payload": {"type": "Client", "data":
//!     {"event": "move", "data": {"roomId": "…", "move": "e4"}}}}
//!
//! {"seq": 9, "timestamp": 812, "payload": {"type": "Reply", "data":
//!     {"ack": 4, "reply": {"kind": "moved", "board": "…"}}}}
//!
//! {"seq": 10, "timestamp": 812, "payload": {"type": "Server", "data":
//!     {"event": "move", "data": {"move": "e4", "board": "…"}}}}
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    ErrorCode, GameOverReason, ParticipantInfo, Role, RoomId, RoomSnapshot,
};

/// Requests a client can send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Declares the connection's display name. Never answered.
    Username(String),

    /// Creates a room with the sender in the white slot.
    /// Answered with [`Reply::RoomCreated`].
    CreateRoom,

    /// Joins a room as a player or spectator.
    /// Answered with [`Reply::Joined`] or [`Reply::Error`].
    JoinRoom { room_id: RoomId },

    /// Submits a move in the game's own input notation.
    /// Answered with [`Reply::Moved`] or [`Reply::Error`].
    Move {
        room_id: RoomId,
        #[serde(rename = "move")]
        mv: String,
    },

    /// Leaves a room. Never answered.
    LeaveRoom { room_id: RoomId },

    /// Closes a room for everyone in it. Only answered when refused.
    CloseRoom { room_id: RoomId },
}

/// The single answer to a client request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Reply {
    /// A room was created for the requester.
    RoomCreated { room_id: RoomId },

    /// The requester joined a room.
    Joined {
        role: Role,
        #[serde(rename = "roomSnapshot")]
        room: RoomSnapshot,
    },

    /// The requester's move was applied.
    Moved { board: String },

    /// The request was refused. Nothing changed.
    Error { error: ErrorCode, message: String },
}

/// Room fan-out pushed to members without being asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// A second player took a slot. Sent to everyone but the newcomer.
    OpponentJoined {
        player: ParticipantInfo,
        role: Role,
        room: RoomSnapshot,
    },

    /// A spectator arrived. Sent to everyone, newcomer included.
    SpectatorJoined {
        spectator: ParticipantInfo,
        spectators: Vec<ParticipantInfo>,
    },

    /// A move was applied.
    Move {
        #[serde(rename = "move")]
        mv: String,
        board: String,
    },

    /// The game ended. `winner` is the mover's name on checkmate and
    /// absent on a draw.
    GameOver {
        winner: Option<String>,
        reason: GameOverReason,
    },

    /// A player left and the room stayed open.
    PlayerDisconnected { player: ParticipantInfo, role: Role },

    /// A spectator left.
    SpectatorDisconnected {
        spectator: ParticipantInfo,
        spectators: Vec<ParticipantInfo>,
    },

    /// The room was closed on request. The receiver is no longer a member.
    CloseRoom { room_id: RoomId },
}

/// What an envelope carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    /// Client → server request.
    Client(ClientEvent),

    /// Server → client answer. `ack` is the `seq` of the request.
    Reply { ack: u64, reply: Reply },

    /// Server → client room fan-out.
    Server(ServerEvent),
}

/// The top-level wire message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-sender sequence number. Replies reference the request's `seq`.
    pub seq: u64,

    /// Milliseconds since the sender's connection started.
    #[serde(default)]
    pub timestamp: u64,

    /// The message itself.
    pub payload: Payload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RoomState, Side};
    use serde_json::json;

    fn room_id() -> RoomId {
        RoomId::new("0f1e2d3c4b5a69788796a5b4c3d2e1f0")
    }

    #[test]
    fn test_username_carries_bare_string() {
        let json = serde_json::to_value(ClientEvent::Username("magnus".into())).unwrap();
        assert_eq!(json, json!({"event": "username", "data": "magnus"}));
    }

    #[test]
    fn test_create_room_has_no_data() {
        let event: ClientEvent = serde_json::from_value(json!({"event": "createRoom"})).unwrap();
        assert_eq!(event, ClientEvent::CreateRoom);
    }

    #[test]
    fn test_move_request_uses_move_key() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "move",
            "data": {"roomId": room_id().as_str(), "move": "e4"}
        }))
        .unwrap();

        assert_eq!(event, ClientEvent::Move { room_id: room_id(), mv: "e4".into() });
    }

    #[test]
    fn test_join_room_reads_camel_case_room_id() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "joinRoom",
            "data": {"roomId": "abc"}
        }))
        .unwrap();
        assert_eq!(event, ClientEvent::JoinRoom { room_id: RoomId::new("abc") });
    }

    #[test]
    fn test_unknown_client_event_is_rejected() {
        let result: Result<ClientEvent, _> =
            serde_json::from_value(json!({"event": "resign", "data": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_error_reply_shape() {
        let reply = Reply::Error {
            error: ErrorCode::RoomNotFound,
            message: "room does not exist".into(),
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(
            json,
            json!({"kind": "error", "error": "roomNotFound", "message": "room does not exist"})
        );
    }

    #[test]
    fn test_joined_reply_shape() {
        let reply = Reply::Joined {
            role: Role::Black,
            room: RoomSnapshot {
                room_id: room_id(),
                state: RoomState::Active,
                white: Some(ParticipantInfo { id: 1, name: "magnus".into() }),
                black: Some(ParticipantInfo { id: 2, name: "hikaru".into() }),
                spectators: vec![],
                board: "start".into(),
                turn: Side::White,
            },
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["kind"], "joined");
        assert_eq!(json["role"], "black");
        assert_eq!(json["roomSnapshot"]["black"]["name"], "hikaru");
        assert!(json.get("room").is_none());
    }

    #[test]
    fn test_game_over_draw_has_null_winner() {
        let event = ServerEvent::GameOver { winner: None, reason: GameOverReason::Draw };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            json!({"event": "gameOver", "data": {"winner": null, "reason": "draw"}})
        );
    }

    #[test]
    fn test_server_move_event_shape() {
        let event = ServerEvent::Move { mv: "Nf3".into(), board: "fen".into() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, json!({"event": "move", "data": {"move": "Nf3", "board": "fen"}}));
    }

    #[test]
    fn test_reply_payload_carries_ack() {
        let payload = Payload::Reply {
            ack: 4,
            reply: Reply::Moved { board: "fen".into() },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "Reply");
        assert_eq!(json["data"]["ack"], 4);
        assert_eq!(json["data"]["reply"]["kind"], "moved");
    }

    #[test]
    fn test_envelope_timestamp_defaults_when_missing() {
        let envelope: Envelope = serde_json::from_value(json!({
            "seq": 1,
            "payload": {"type": "Client", "data": {"event": "createRoom"}}
        }))
        .unwrap();
        assert_eq!(envelope.timestamp, 0);
        assert_eq!(envelope.payload, Payload::Client(ClientEvent::CreateRoom));
    }
}
