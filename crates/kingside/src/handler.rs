//! Per-connection handler: registration, request dispatch, and teardown.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register the connection and its outbound queue
//!   2. Spawn the writer task that drains the queue onto the socket
//!   3. Loop: receive envelopes → dispatch client events → queue replies
//!   4. Tear down exactly once: registry, rooms, gateway

use std::sync::Arc;
use std::time::Instant;

use kingside_protocol::{ClientEvent, Codec, Envelope, Payload, ProtocolError, Reply};
use kingside_room::{GameRules, OutboundReceiver, OutboundSender, RoomError};
use kingside_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::KingsideError;
use crate::server::ServerState;

/// Drop guard that tears the connection down if the handler exits without
/// reaching its own teardown (a panic in dispatch, for example).
///
/// Since `Drop` is synchronous, it spawns a fire-and-forget task.
/// Teardown is keyed on the registry removal, so running it twice is a
/// no-op.
struct ConnectionGuard<G: GameRules, C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<G, C>>,
}

impl<G: GameRules, C: Codec> Drop for ConnectionGuard<G, C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            teardown(&state, conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<G, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<G, C>>,
) -> Result<(), KingsideError>
where
    G: GameRules,
    C: Codec,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    state.registry.lock().await.register(conn_id)?;
    let (outbound, outbound_rx) = mpsc::unbounded_channel();
    state.rooms.gateway().register(conn_id, outbound.clone());
    let _guard = ConnectionGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    let writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), outbound_rx));

    read_loop(&conn, &state, &outbound).await;

    teardown(&state, conn_id).await;

    // The gateway's copy of the sender is gone; dropping ours lets the
    // writer flush what's queued and stop.
    drop(outbound);
    if writer.await.is_err() {
        tracing::debug!(%conn_id, "writer task panicked");
    }
    let _ = conn.close().await;
    Ok(())
}

/// Reads frames until the peer goes away. Frames that do not decode to a
/// client event are skipped.
async fn read_loop<G, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<G, C>>,
    outbound: &OutboundSender,
) where
    G: GameRules,
    C: Codec,
{
    let conn_id = conn.id();
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let (seq, event) = match client_event(&state.codec, &data) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "dropping frame");
                continue;
            }
        };

        let reply = match dispatch(state, conn_id, event).await {
            Ok(reply) => reply,
            Err(KingsideError::Room(e)) => Some(rejected(conn_id, &e)),
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "request failed");
                None
            }
        };
        if let Some(reply) = reply {
            let payload = Payload::Reply { ack: seq, reply };
            if outbound.send(payload).is_err() {
                break;
            }
        }
    }
}

/// Decodes a frame and checks that it carries a client event. Returns the
/// request's seq alongside the event.
fn client_event<C: Codec>(codec: &C, data: &[u8]) -> Result<(u64, ClientEvent), KingsideError> {
    let envelope: Envelope = codec.decode(data)?;
    match envelope.payload {
        Payload::Client(event) => Ok((envelope.seq, event)),
        Payload::Reply { .. } | Payload::Server(_) => Err(ProtocolError::InvalidMessage(format!(
            "seq {}: clients may only send client events",
            envelope.seq
        ))
        .into()),
    }
}

/// Runs one client event. Returns the reply to send back, if the event
/// gets one. Room errors come back as `KingsideError::Room` and are
/// answered with an error reply.
async fn dispatch<G, C>(
    state: &Arc<ServerState<G, C>>,
    conn_id: ConnectionId,
    event: ClientEvent,
) -> Result<Option<Reply>, KingsideError>
where
    G: GameRules,
    C: Codec,
{
    let reply = match event {
        ClientEvent::Username(name) => {
            if let Err(e) = state.registry.lock().await.set_display_name(conn_id, &name) {
                tracing::debug!(%conn_id, error = %e, "set display name failed");
            }
            None
        }

        ClientEvent::CreateRoom => {
            let name = display_name(state, conn_id).await;
            let room_id = state.rooms.create_room(conn_id, name).await;
            Some(Reply::RoomCreated { room_id })
        }

        ClientEvent::JoinRoom { room_id } => {
            let name = display_name(state, conn_id).await;
            let joined = state.rooms.join(&room_id, conn_id, name).await?;
            Some(Reply::Joined {
                role: joined.role,
                room: joined.room,
            })
        }

        ClientEvent::Move { room_id, mv } => {
            let board = state.rooms.make_move(&room_id, conn_id, &mv).await?;
            Some(Reply::Moved { board })
        }

        ClientEvent::LeaveRoom { room_id } => {
            state.rooms.leave(&room_id, conn_id).await;
            None
        }

        ClientEvent::CloseRoom { room_id } => {
            state.rooms.close_room(&room_id, conn_id).await?;
            None
        }
    };
    Ok(reply)
}

/// Drains the outbound queue onto the socket, stamping each payload with
/// this connection's sequence number and elapsed time.
async fn write_loop<G, C>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<G, C>>,
    mut outbound: OutboundReceiver,
) where
    G: GameRules,
    C: Codec,
{
    let conn_id = conn.id();
    let start = Instant::now();
    let mut seq: u64 = 1;

    while let Some(payload) = outbound.recv().await {
        let envelope = Envelope {
            seq: next_seq(&mut seq),
            timestamp: start.elapsed().as_millis() as u64,
            payload,
        };
        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "failed to encode envelope");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}

/// Removes the connection from the registry, every room, and the gateway.
///
/// Only the call that actually removes the registry entry does the room
/// teardown, so each physical disconnect reaches the rooms exactly once.
async fn teardown<G, C>(state: &ServerState<G, C>, conn_id: ConnectionId)
where
    G: GameRules,
    C: Codec,
{
    let Some(record) = state.registry.lock().await.remove(conn_id) else {
        return;
    };
    let closed = state.rooms.on_connection_disconnected(conn_id).await;
    state.rooms.gateway().unregister(conn_id);
    tracing::info!(
        %conn_id,
        name = %record.display_name(),
        connected_for = ?record.age(),
        rooms_closed = closed.len(),
        "connection torn down"
    );
}

async fn display_name<G, C>(state: &ServerState<G, C>, conn_id: ConnectionId) -> String
where
    G: GameRules,
    C: Codec,
{
    state
        .registry
        .lock()
        .await
        .display_name(conn_id)
        .unwrap_or_else(|_| format!("guest-{}", conn_id.into_inner()))
}

fn rejected(conn_id: ConnectionId, err: &RoomError) -> Reply {
    tracing::debug!(%conn_id, error = %err, "request rejected");
    Reply::Error {
        error: err.code(),
        message: err.to_string(),
    }
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
