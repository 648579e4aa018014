//! Room lifecycle management for Kingside.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! seats and game state. Requests for one room are applied one at a time;
//! different rooms never wait on each other.
//!
//! # Key types
//!
//! - [`GameRules`]: the move-legality trait a game plugs in
//! - [`RoomManager`]: creates, joins, and tears down rooms
//! - [`RoomStore`]: the index of live rooms
//! - [`RoomHandle`]: sends commands to a running room actor
//! - [`Room`]: the per-room state machine
//! - [`Gateway`]: fans room events out to connections
//! - [`RoomConfig`]: minimum players, queue size, close policy

mod actor;
mod broadcast;
mod config;
mod error;
mod manager;
mod room;
mod rules;
mod store;
#[cfg(test)]
mod testing;

pub use actor::RoomHandle;
pub use broadcast::{Gateway, OutboundReceiver, OutboundSender};
pub use config::{ClosePolicy, RoomConfig};
pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{Departure, Joined, Member, Room, Seat};
pub use rules::{GameRules, Outcome};
pub use store::RoomStore;
