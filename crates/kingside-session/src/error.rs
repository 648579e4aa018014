//! Error types for the session layer.

use kingside_transport::ConnectionId;

/// Errors that can occur while managing connection records.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No record exists for the connection. Either it never registered or
    /// it already disconnected.
    #[error("no session for connection {0}")]
    NotFound(ConnectionId),

    /// The connection id is already registered. Ids are never reused, so
    /// this means the handler registered the same connection twice.
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),
}
