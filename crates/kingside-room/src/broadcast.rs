//! Broadcast gateway: fan-out from rooms to connections.
//!
//! Rooms never touch sockets. Each connection registers an outbound
//! queue here when it connects; rooms attach and detach connections to
//! their broadcast group and push [`ServerEvent`]s by room id. The
//! connection handler drains the queue and writes frames.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use kingside_protocol::{Payload, RoomId, ServerEvent};
use kingside_transport::ConnectionId;
use tokio::sync::mpsc;

/// Channel sender for delivering outbound payloads to one connection.
pub type OutboundSender = mpsc::UnboundedSender<Payload>;

/// Channel receiver drained by a connection's writer task.
pub type OutboundReceiver = mpsc::UnboundedReceiver<Payload>;

#[derive(Default)]
struct Routes {
    outbound: HashMap<ConnectionId, OutboundSender>,
    groups: HashMap<RoomId, BTreeSet<ConnectionId>>,
}

/// Routes room events to the connections attached to each room.
///
/// Sends never block: they push onto an unbounded queue. A connection
/// whose queue is gone (its handler already exited) is skipped with a
/// debug log, so one dead connection never stops a broadcast reaching
/// the others.
///
/// The internal lock is a `std` mutex held only for map operations and
/// never across an `.await`.
#[derive(Default)]
pub struct Gateway {
    routes: Mutex<Routes>,
}

impl Gateway {
    /// Creates a gateway with no connections.
    pub fn new() -> Self {
        Self::default()
    }

    fn routes(&self) -> MutexGuard<'_, Routes> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a connection's outbound queue.
    pub fn register(&self, conn_id: ConnectionId, sender: OutboundSender) {
        self.routes().outbound.insert(conn_id, sender);
    }

    /// Drops a connection's outbound queue and any group memberships it
    /// still has.
    pub fn unregister(&self, conn_id: ConnectionId) {
        let mut routes = self.routes();
        routes.outbound.remove(&conn_id);
        routes.groups.retain(|_, members| {
            members.remove(&conn_id);
            !members.is_empty()
        });
    }

    /// Adds a connection to a room's broadcast group.
    pub fn attach(&self, room_id: &RoomId, conn_id: ConnectionId) {
        self.routes()
            .groups
            .entry(room_id.clone())
            .or_default()
            .insert(conn_id);
    }

    /// Removes a connection from a room's broadcast group. Returns `true`
    /// if it was attached.
    pub fn detach(&self, room_id: &RoomId, conn_id: ConnectionId) -> bool {
        let mut routes = self.routes();
        let Some(members) = routes.groups.get_mut(room_id) else {
            return false;
        };
        let removed = members.remove(&conn_id);
        if members.is_empty() {
            routes.groups.remove(room_id);
        }
        removed
    }

    /// Removes a room's whole broadcast group, returning who was in it.
    pub fn detach_all(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.routes()
            .groups
            .remove(room_id)
            .map(|members| members.into_iter().collect())
            .unwrap_or_default()
    }

    /// Returns the connections currently attached to a room.
    pub fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.routes()
            .groups
            .get(room_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Sends an event to one connection. Returns `true` if it was queued.
    pub fn send_to(&self, conn_id: ConnectionId, event: ServerEvent) -> bool {
        let sender = self.routes().outbound.get(&conn_id).cloned();
        match sender {
            Some(sender) => deliver(conn_id, &sender, Payload::Server(event)),
            None => {
                tracing::debug!(%conn_id, "no outbound queue, event dropped");
                false
            }
        }
    }

    /// Sends an event to every connection attached to `room_id`, except
    /// `excluding` if given. Returns how many connections it was queued
    /// for.
    ///
    /// Membership is read once, up front: a connection attaching or
    /// detaching while the broadcast is in flight may or may not get it.
    pub fn send_to_room(
        &self,
        room_id: &RoomId,
        event: ServerEvent,
        excluding: Option<ConnectionId>,
    ) -> usize {
        let targets: Vec<(ConnectionId, OutboundSender)> = {
            let routes = self.routes();
            let Some(members) = routes.groups.get(room_id) else {
                return 0;
            };
            members
                .iter()
                .filter(|id| Some(**id) != excluding)
                .filter_map(|id| routes.outbound.get(id).map(|tx| (*id, tx.clone())))
                .collect()
        };

        let payload = Payload::Server(event);
        let mut delivered = 0;
        for (id, tx) in &targets {
            if deliver(*id, tx, payload.clone()) {
                delivered += 1;
            }
        }
        delivered
    }
}

fn deliver(conn_id: ConnectionId, sender: &OutboundSender, payload: Payload) -> bool {
    match sender.send(payload) {
        Ok(()) => true,
        Err(_) => {
            tracing::debug!(%conn_id, "outbound queue closed, event dropped");
            false
        }
    }
}
