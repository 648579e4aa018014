//! The per-connection record.

use std::time::{Duration, Instant};

use kingside_transport::ConnectionId;

/// What the server knows about one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionRecord {
    /// The transport-assigned id.
    pub id: ConnectionId,

    /// The declared display name, if the client sent one.
    pub display_name: Option<String>,

    /// When the connection registered.
    pub connected_at: Instant,
}

impl ConnectionRecord {
    pub(crate) fn new(id: ConnectionId) -> Self {
        Self {
            id,
            display_name: None,
            connected_at: Instant::now(),
        }
    }

    /// Returns the name to show other room members.
    ///
    /// Connections that never declared a name show up as `guest-<id>`,
    /// which can't collide with another live connection's fallback.
    pub fn display_name(&self) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None => format!("guest-{}", self.id.into_inner()),
        }
    }

    /// How long the connection has been registered.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
