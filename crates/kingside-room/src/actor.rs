//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Every operation on a room goes through its command channel and runs to
//! completion before the next one starts. Nothing else holds the room, so
//! two moves sent at the same instant are applied one after the other.

use kingside_protocol::{RoomId, RoomSnapshot};
use kingside_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::room::{Departure, Joined, Member, Room};
use crate::{GameRules, RoomError};

/// Commands sent to a room actor through its channel.
///
/// Each variant carries a `oneshot` reply channel: the caller sends the
/// command and waits for the result there.
pub(crate) enum RoomCommand {
    Join {
        member: Member,
        reply: oneshot::Sender<Result<Joined, RoomError>>,
    },
    Move {
        conn_id: ConnectionId,
        input: String,
        reply: oneshot::Sender<Result<String, RoomError>>,
    },
    Leave {
        conn_id: ConnectionId,
        reply: oneshot::Sender<Departure>,
    },
    Close {
        requestor: ConnectionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

/// Handle to a running room actor.
///
/// Cheap to clone: it's an `mpsc::Sender` and the room id. Once the actor
/// has stopped (the room closed), every call reports
/// [`RoomError::NotFound`].
pub struct RoomHandle<G: GameRules> {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
    _rules: std::marker::PhantomData<fn() -> G>,
}

impl<G: GameRules> Clone for RoomHandle<G> {
    fn clone(&self) -> Self {
        Self {
            room_id: self.room_id.clone(),
            sender: self.sender.clone(),
            _rules: std::marker::PhantomData,
        }
    }
}

impl<G: GameRules> RoomHandle<G> {
    /// Returns the room's id.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Seats a member in the room.
    pub async fn join(&self, member: Member) -> Result<Joined, RoomError> {
        self.request(|reply| RoomCommand::Join { member, reply })
            .await?
    }

    /// Submits a move, returning the new board.
    pub async fn make_move(
        &self,
        conn_id: ConnectionId,
        input: impl Into<String>,
    ) -> Result<String, RoomError> {
        let input = input.into();
        self.request(|reply| RoomCommand::Move { conn_id, input, reply })
            .await?
    }

    /// Removes a connection from the room.
    ///
    /// A room that already stopped has nobody in it, so this reports
    /// [`Departure::NotMember`] rather than an error.
    pub async fn leave(&self, conn_id: ConnectionId) -> Departure {
        self.request(|reply| RoomCommand::Leave { conn_id, reply })
            .await
            .unwrap_or(Departure::NotMember)
    }

    /// Asks the room to close on behalf of `requestor`.
    pub async fn close(&self, requestor: ConnectionId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Close { requestor, reply })
            .await?
    }

    /// Requests the current room snapshot.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::NotFound(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::NotFound(self.room_id.clone()))
    }
}

struct RoomActor<G: GameRules> {
    room: Room<G>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<G: GameRules> RoomActor<G> {
    /// Runs the actor loop until the room closes or every handle is
    /// dropped.
    async fn run(mut self) {
        tracing::debug!(room_id = %self.room.id(), "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { member, reply } => {
                    let _ = reply.send(self.room.join(member));
                }
                RoomCommand::Move { conn_id, input, reply } => {
                    let _ = reply.send(self.room.make_move(conn_id, &input));
                }
                RoomCommand::Leave { conn_id, reply } => {
                    let _ = reply.send(self.room.leave(conn_id));
                }
                RoomCommand::Close { requestor, reply } => {
                    let _ = reply.send(self.room.close(requestor));
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.room.snapshot());
                }
            }
            if self.room.is_closed() {
                break;
            }
        }

        // Commands still queued behind the close see their reply channel
        // dropped and report NotFound.
        self.receiver.close();
        tracing::debug!(room_id = %self.room.id(), "room actor stopped");
    }
}

/// Spawns a room actor task and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub(crate) fn spawn_room<G: GameRules>(room: Room<G>, channel_size: usize) -> RoomHandle<G> {
    let (tx, rx) = mpsc::channel(channel_size.max(1));
    let room_id = room.id().clone();

    tokio::spawn(RoomActor { room, receiver: rx }.run());

    RoomHandle {
        room_id,
        sender: tx,
        _rules: std::marker::PhantomData,
    }
}
