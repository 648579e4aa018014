//! Per-connection session data for Kingside.
//!
//! The only thing a client says about itself is a display name. This
//! crate keeps that name in a typed record keyed by [`ConnectionId`],
//! instead of hanging ad hoc fields off the socket object.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← asks for a connection's display name on create/join
//!     ↕
//! Session Layer (this crate)  ← connection id → ConnectionRecord
//!     ↕
//! Transport Layer (below)  ← allocates ConnectionIds
//! ```
//!
//! There is no authentication: names are self-declared, and uniqueness is
//! enforced per room by the room layer, not here.
//!
//! [`ConnectionId`]: kingside_transport::ConnectionId

mod connection;
mod error;
mod registry;

pub use connection::ConnectionRecord;
pub use error::SessionError;
pub use registry::ConnectionRegistry;
