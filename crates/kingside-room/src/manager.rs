//! Room manager: the entry point for room operations from the server.

use std::sync::Arc;

use kingside_protocol::{RoomId, RoomSnapshot};
use kingside_transport::ConnectionId;

use crate::room::{Departure, Joined, Member};
use crate::store::RoomStore;
use crate::{Gateway, GameRules, RoomConfig, RoomError};

/// Owns the room store and the broadcast gateway, and keeps them in step:
/// a room that closes is deleted from the store by whichever call saw it
/// close.
///
/// Every method takes `&self`; share the manager behind an `Arc`.
pub struct RoomManager<G: GameRules> {
    store: RoomStore<G>,
    gateway: Arc<Gateway>,
}

impl<G: GameRules> RoomManager<G> {
    /// Creates a manager with no rooms.
    pub fn new(config: RoomConfig) -> Self {
        let gateway = Arc::new(Gateway::new());
        Self {
            store: RoomStore::new(config, Arc::clone(&gateway)),
            gateway,
        }
    }

    /// The gateway rooms broadcast through. Connections register their
    /// outbound queues here.
    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    /// Creates a room with the caller seated as white.
    pub async fn create_room(&self, conn_id: ConnectionId, name: impl Into<String>) -> RoomId {
        let room_id = self.store.create(Member::new(conn_id, name)).await;
        tracing::info!(%room_id, creator = %conn_id, "room created");
        room_id
    }

    /// Seats a connection in a room as a player or spectator.
    pub async fn join(
        &self,
        room_id: &RoomId,
        conn_id: ConnectionId,
        name: impl Into<String>,
    ) -> Result<Joined, RoomError> {
        let handle = self.store.get(room_id).await?;
        let joined = handle.join(Member::new(conn_id, name)).await?;
        tracing::info!(%room_id, %conn_id, role = ?joined.role, "joined room");
        Ok(joined)
    }

    /// Submits a move, returning the new board.
    pub async fn make_move(
        &self,
        room_id: &RoomId,
        conn_id: ConnectionId,
        input: &str,
    ) -> Result<String, RoomError> {
        self.store.get(room_id).await?.make_move(conn_id, input).await
    }

    /// Removes a connection from a room, deleting the room if it closed.
    ///
    /// An unknown room, or one the connection isn't in, is a no-op.
    pub async fn leave(&self, room_id: &RoomId, conn_id: ConnectionId) -> Departure {
        let Ok(handle) = self.store.get(room_id).await else {
            return Departure::NotMember;
        };
        let departure = handle.leave(conn_id).await;
        self.settle(room_id, conn_id, departure).await;
        departure
    }

    /// Closes a room on request and deletes it.
    pub async fn close_room(&self, room_id: &RoomId, requestor: ConnectionId) -> Result<(), RoomError> {
        self.store.get(room_id).await?.close(requestor).await?;
        if self.store.delete(room_id).await {
            tracing::info!(%room_id, %requestor, "room deleted after close");
        }
        Ok(())
    }

    /// Removes a disconnected connection from every room it is in.
    ///
    /// Scans every live room rather than trusting any per-connection
    /// index. Returns the ids of rooms that closed as a result.
    pub async fn on_connection_disconnected(&self, conn_id: ConnectionId) -> Vec<RoomId> {
        let mut closed = Vec::new();
        for handle in self.store.handles().await {
            let room_id = handle.room_id().clone();
            let departure = handle.leave(conn_id).await;
            self.settle(&room_id, conn_id, departure).await;
            if departure == Departure::Closed {
                closed.push(room_id);
            }
        }
        closed
    }

    /// Current snapshot of a room.
    pub async fn room_snapshot(&self, room_id: &RoomId) -> Result<RoomSnapshot, RoomError> {
        self.store.get(room_id).await?.snapshot().await
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.store.len().await
    }

    /// Ids of every live room.
    pub async fn room_ids(&self) -> Vec<RoomId> {
        self.store.room_ids().await
    }

    async fn settle(&self, room_id: &RoomId, conn_id: ConnectionId, departure: Departure) {
        match departure {
            Departure::NotMember => {}
            Departure::Left(role) => {
                tracing::info!(%room_id, %conn_id, ?role, "left room");
            }
            Departure::Closed => {
                if self.store.delete(room_id).await {
                    tracing::info!(%room_id, %conn_id, "room deleted, not enough players");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use kingside_protocol::Role;

    use super::*;
    use crate::testing::ScriptedRules;

    fn cid(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[tokio::test]
    async fn test_join_unknown_room_is_not_found() {
        let mgr = RoomManager::<ScriptedRules>::new(RoomConfig::default());
        let result = mgr.join(&RoomId::new("missing"), cid(1), "magnus").await;
        assert!(matches!(result, Err(RoomError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_leave_unknown_room_is_no_op() {
        let mgr = RoomManager::<ScriptedRules>::new(RoomConfig::default());
        assert_eq!(mgr.leave(&RoomId::new("missing"), cid(1)).await, Departure::NotMember);
    }

    #[tokio::test]
    async fn test_leave_last_player_deletes_room() {
        let mgr = RoomManager::<ScriptedRules>::new(RoomConfig::default());
        let room = mgr.create_room(cid(1), "magnus").await;

        assert_eq!(mgr.leave(&room, cid(1)).await, Departure::Closed);

        assert_eq!(mgr.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_close_room_deletes_it() {
        let mgr = RoomManager::<ScriptedRules>::new(RoomConfig::default());
        let room = mgr.create_room(cid(1), "magnus").await;

        mgr.close_room(&room, cid(1)).await.unwrap();

        assert_eq!(mgr.room_count().await, 0);
        assert!(matches!(mgr.room_snapshot(&room).await, Err(RoomError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_disconnect_touches_only_rooms_the_connection_is_in() {
        let mgr = RoomManager::<ScriptedRules>::new(RoomConfig::default());
        let mine = mgr.create_room(cid(1), "magnus").await;
        let other = mgr.create_room(cid(2), "hikaru").await;
        mgr.join(&other, cid(3), "judit").await.unwrap();

        let closed = mgr.on_connection_disconnected(cid(1)).await;

        assert_eq!(closed, vec![mine]);
        let snapshot = mgr.room_snapshot(&other).await.unwrap();
        assert_eq!(snapshot.black.map(|p| p.name), Some("judit".to_string()));
        assert_eq!(
            mgr.join(&other, cid(3), "judit").await.unwrap().role,
            Role::Black
        );
    }
}
