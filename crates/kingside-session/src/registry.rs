//! The connection registry: connection id → session record.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is a plain `HashMap` with no locking of its own.
//! The server wraps it in a mutex and only holds that lock for single
//! map operations.

use std::collections::HashMap;

use kingside_transport::ConnectionId;

use crate::{ConnectionRecord, SessionError};

/// Tracks every live connection and its declared display name.
///
/// ```text
/// register() ──→ set_display_name()* ──→ remove()
///                                          │
///                                          ▼
///                         Some(record) exactly once, None afterwards
/// ```
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionRecord>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the record for a freshly accepted connection.
    pub fn register(&mut self, id: ConnectionId) -> Result<&ConnectionRecord, SessionError> {
        if self.connections.contains_key(&id) {
            return Err(SessionError::AlreadyRegistered(id));
        }
        tracing::debug!(conn_id = %id, "connection registered");
        Ok(self
            .connections
            .entry(id)
            .or_insert_with(|| ConnectionRecord::new(id)))
    }

    /// Stores the connection's display name. Last write wins.
    ///
    /// The name is trimmed; a blank name clears any earlier declaration so
    /// the connection falls back to its guest name.
    pub fn set_display_name(&mut self, id: ConnectionId, name: &str) -> Result<(), SessionError> {
        let record = self
            .connections
            .get_mut(&id)
            .ok_or(SessionError::NotFound(id))?;

        let name = name.trim();
        record.display_name = if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        };
        tracing::info!(conn_id = %id, name = %record.display_name(), "display name set");
        Ok(())
    }

    /// Returns the name the connection should be seated under.
    pub fn display_name(&self, id: ConnectionId) -> Result<String, SessionError> {
        self.connections
            .get(&id)
            .map(ConnectionRecord::display_name)
            .ok_or(SessionError::NotFound(id))
    }

    /// Removes the connection's record.
    ///
    /// Returns the record the first time and `None` on every later call.
    /// The caller uses that single `Some` as the signal to tear down the
    /// connection's room memberships, so cleanup runs once per disconnect.
    pub fn remove(&mut self, id: ConnectionId) -> Option<ConnectionRecord> {
        let removed = self.connections.remove(&id);
        if removed.is_some() {
            tracing::debug!(conn_id = %id, "connection unregistered");
        }
        removed
    }

    /// Looks up a connection's record.
    pub fn get(&self, id: ConnectionId) -> Option<&ConnectionRecord> {
        self.connections.get(&id)
    }

    /// Returns the number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
