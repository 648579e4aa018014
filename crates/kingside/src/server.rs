//! `KingsideServer` builder and server loop.
//!
//! This is the entry point for running a Kingside server. It ties the
//! layers together: transport → protocol → connection registry → rooms.

use std::net::SocketAddr;
use std::sync::Arc;

use kingside_protocol::{Codec, JsonCodec};
use kingside_room::{GameRules, RoomConfig, RoomManager};
use kingside_session::ConnectionRegistry;
use kingside_transport::{Transport, WebSocketTransport};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::KingsideError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<G: GameRules, C: Codec> {
    pub(crate) registry: Mutex<ConnectionRegistry>,
    pub(crate) rooms: Arc<RoomManager<G>>,
    pub(crate) codec: C,
}

/// Everything the builder can be configured with, in one serializable
/// struct.
///
/// ```
/// let config: kingside::ServerConfig = serde_json::from_str(
///     r#"{"bindAddr": "0.0.0.0:9000", "rooms": {"closePolicy": "membersOnly"}}"#,
/// ).unwrap();
/// assert_eq!(config.rooms.min_players, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,
    /// Settings shared by every room.
    pub rooms: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            rooms: RoomConfig::default(),
        }
    }
}

/// Builder for configuring and starting a Kingside server.
///
/// # Example
///
/// `TicTacToe` is the `GameRules` implementation in `demos/tic-tac-toe`.
///
/// ```rust,ignore
/// use kingside::prelude::*;
///
/// let server = KingsideServer::builder()
///     .bind("0.0.0.0:8080")
///     .build::<TicTacToe>()
///     .await?;
/// server.run().await
/// ```
pub struct KingsideServerBuilder {
    config: ServerConfig,
}

impl KingsideServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration shared by every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.rooms = config;
        self
    }

    /// Binds the listener and builds the server for game `G`.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<G: GameRules>(self) -> Result<KingsideServer<G, JsonCodec>, KingsideError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(ConnectionRegistry::new()),
            rooms: Arc::new(RoomManager::new(self.config.rooms)),
            codec: JsonCodec,
        });

        Ok(KingsideServer { transport, state })
    }
}

impl Default for KingsideServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Kingside server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct KingsideServer<G: GameRules, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<G, C>>,
}

impl<G: GameRules> KingsideServer<G, JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> KingsideServerBuilder {
        KingsideServerBuilder::new()
    }
}

impl<G, C> KingsideServer<G, C>
where
    G: GameRules,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, KingsideError> {
        Ok(self.transport.local_addr()?)
    }

    /// The room manager, for inspecting live rooms.
    pub fn rooms(&self) -> Arc<RoomManager<G>> {
        Arc::clone(&self.state.rooms)
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated; a failed accept is logged and skipped.
    pub async fn run(mut self) -> Result<(), KingsideError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "kingside server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
