//! # Kingside
//!
//! Real-time rooms for two-player, turn-based board games over WebSocket.
//!
//! Kingside owns the room lifecycle (seating, turn order, spectators,
//! disconnects) and fans room events out to every member. Move legality
//! is delegated to a [`GameRules`](kingside_room::GameRules)
//! implementation supplied by the game.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kingside::prelude::*;
//!
//! // Implement GameRules for your game (demos/tic-tac-toe has one), then:
//! // kingside::telemetry::init_tracing("info");
//! // let server = KingsideServer::builder()
//! //     .bind("0.0.0.0:8080")
//! //     .build::<MyGame>()
//! //     .await?;
//! // server.run().await
//! ```

mod error;
mod handler;
mod server;
pub mod telemetry;

pub use error::KingsideError;
pub use server::{KingsideServer, KingsideServerBuilder, ServerConfig};

pub use kingside_protocol as protocol;
pub use kingside_room as room;

pub mod prelude {
    //! The types most servers need.

    pub use crate::{KingsideError, KingsideServer, KingsideServerBuilder, ServerConfig};
    pub use kingside_protocol::{
        ClientEvent, ErrorCode, GameOverReason, Reply, Role, RoomId, RoomSnapshot, RoomState,
        ServerEvent, Side,
    };
    pub use kingside_room::{ClosePolicy, GameRules, Outcome, RoomConfig};
}
