//! Wire protocol for Kingside.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Identity and room types** ([`RoomId`], [`Side`], [`Role`],
//!   [`RoomSnapshot`], ...): the nouns that show up in events.
//! - **Events** ([`ClientEvent`], [`ServerEvent`], [`Reply`]) wrapped in
//!   an [`Envelope`].
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, envelopes out.
//!
//! The protocol layer knows nothing about sockets or room state. It sits
//! between the transport (raw frames) and the room layer (typed events):
//!
//! ```text
//! Transport (frames) → Protocol (Envelope) → Room (state machine)
//! ```
//!
//! # Request/reply
//!
//! Every client request travels with its envelope `seq`. When a request
//! has an answer, the server sends exactly one [`Payload::Reply`] whose
//! `ack` echoes that `seq`. Room fan-out goes out as [`Payload::Server`].

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, Envelope, Payload, Reply, ServerEvent};
pub use types::{
    ErrorCode, GameOverReason, ParticipantInfo, Role, RoomId, RoomSnapshot,
    RoomState, Side,
};
