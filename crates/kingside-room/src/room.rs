//! The per-room state machine.
//!
//! A [`Room`] owns the seats, the spectator list, and the authoritative
//! game state. Its methods are synchronous and run inside the room's
//! actor task (see `actor.rs`), so each one is a single critical section:
//! checking the turn and applying the move can't interleave with another
//! request for the same room.

use std::sync::Arc;

use kingside_protocol::{
    GameOverReason, ParticipantInfo, Role, RoomId, RoomSnapshot, RoomState,
    ServerEvent, Side,
};
use kingside_transport::ConnectionId;

use crate::{ClosePolicy, Gateway, GameRules, Outcome, RoomConfig, RoomError};

/// A connection seated in a room, under the name it joined with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// The member's connection.
    pub id: ConnectionId,
    /// The display name, unique within the room.
    pub name: String,
}

impl Member {
    /// Creates a member record.
    pub fn new(id: ConnectionId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }

    fn info(&self) -> ParticipantInfo {
        ParticipantInfo {
            id: self.id.into_inner(),
            name: self.name.clone(),
        }
    }
}

/// Where a connection sits in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    /// Holds a player slot.
    Player(Side),
    /// Watches.
    Spectator,
    /// Not in the room.
    Absent,
}

impl Seat {
    /// The role this seat was joined as, or `None` when absent.
    pub fn role(self) -> Option<Role> {
        match self {
            Self::Player(side) => Some(side.into()),
            Self::Spectator => Some(Role::Spectator),
            Self::Absent => None,
        }
    }
}

/// A successful join: the role handed out and the room as it now looks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    /// Role assigned to the joining connection.
    pub role: Role,
    /// Room snapshot taken right after the join.
    pub room: RoomSnapshot,
}

/// What a leave did to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The connection wasn't in the room. Nothing changed.
    NotMember,
    /// The connection left; the room stays open.
    Left(Role),
    /// The connection left and the room closed behind it. The caller must
    /// delete it from the store.
    Closed,
}

/// One game session: two player slots, any number of spectators.
pub struct Room<G: GameRules> {
    id: RoomId,
    config: RoomConfig,
    state: RoomState,
    white: Option<Member>,
    black: Option<Member>,
    spectators: Vec<Member>,
    game: G::State,
    gateway: Arc<Gateway>,
}

impl<G: GameRules> Room<G> {
    /// Creates a room with `creator` in the white slot and attaches the
    /// creator to the room's broadcast group.
    pub fn new(id: RoomId, creator: Member, config: RoomConfig, gateway: Arc<Gateway>) -> Self {
        gateway.attach(&id, creator.id);
        Self {
            id,
            config,
            state: RoomState::Forming,
            white: Some(creator),
            black: None,
            spectators: Vec::new(),
            game: G::initial_state(),
            gateway,
        }
    }

    /// The room's id.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RoomState {
        self.state
    }

    /// Returns `true` once the room has closed.
    pub fn is_closed(&self) -> bool {
        self.state == RoomState::Closed
    }

    /// Number of occupied player slots.
    pub fn player_count(&self) -> usize {
        usize::from(self.white.is_some()) + usize::from(self.black.is_some())
    }

    /// Where `conn_id` sits in this room.
    pub fn seat_of(&self, conn_id: ConnectionId) -> Seat {
        if self.white.as_ref().is_some_and(|m| m.id == conn_id) {
            Seat::Player(Side::White)
        } else if self.black.as_ref().is_some_and(|m| m.id == conn_id) {
            Seat::Player(Side::Black)
        } else if self.spectators.iter().any(|m| m.id == conn_id) {
            Seat::Spectator
        } else {
            Seat::Absent
        }
    }

    /// A client-facing view of the room.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id.clone(),
            state: self.state,
            white: self.white.as_ref().map(Member::info),
            black: self.black.as_ref().map(Member::info),
            spectators: self.spectator_infos(),
            board: G::board(&self.game),
            turn: G::side_to_move(&self.game),
        }
    }

    /// Seats `member` in the first open player slot, or as a spectator
    /// when both slots are taken.
    ///
    /// A connection already seated here gets its current role back and no
    /// one is notified.
    pub fn join(&mut self, member: Member) -> Result<Joined, RoomError> {
        if let Some(role) = self.seat_of(member.id).role() {
            tracing::debug!(room_id = %self.id, conn_id = %member.id, %role, "already seated");
            return Ok(Joined { role, room: self.snapshot() });
        }
        if self.members().any(|m| m.name == member.name) {
            return Err(RoomError::NameConflict {
                name: member.name,
                room_id: self.id.clone(),
            });
        }

        let conn_id = member.id;
        let info = member.info();
        self.gateway.attach(&self.id, conn_id);

        let open = [Side::White, Side::Black]
            .into_iter()
            .find(|side| self.slot(*side).is_none());

        match open {
            Some(side) => {
                *self.slot_mut(side) = Some(member);
                if self.player_count() == 2 && self.state == RoomState::Forming {
                    self.state = RoomState::Active;
                }
                let room = self.snapshot();
                tracing::info!(
                    room_id = %self.id,
                    %conn_id,
                    %side,
                    state = %self.state,
                    "player joined"
                );
                self.gateway.send_to_room(
                    &self.id,
                    ServerEvent::OpponentJoined {
                        player: info,
                        role: side.into(),
                        room: room.clone(),
                    },
                    Some(conn_id),
                );
                Ok(Joined { role: side.into(), room })
            }
            None => {
                self.spectators.push(member);
                tracing::info!(
                    room_id = %self.id,
                    %conn_id,
                    spectators = self.spectators.len(),
                    "spectator joined"
                );
                self.gateway.send_to_room(
                    &self.id,
                    ServerEvent::SpectatorJoined {
                        spectator: info,
                        spectators: self.spectator_infos(),
                    },
                    None,
                );
                Ok(Joined {
                    role: Role::Spectator,
                    room: self.snapshot(),
                })
            }
        }
    }

    /// Validates and applies a move from `conn_id`, returning the new
    /// board.
    ///
    /// Checks run in order: seat, turn, game over, legality. Any failure
    /// leaves the game state, the seats, and the turn as they were.
    pub fn make_move(&mut self, conn_id: ConnectionId, input: &str) -> Result<String, RoomError> {
        let Seat::Player(side) = self.seat_of(conn_id) else {
            return Err(RoomError::NotAPlayer(conn_id, self.id.clone()));
        };
        let to_move = G::side_to_move(&self.game);
        if side != to_move {
            return Err(RoomError::NotYourTurn { to_move });
        }
        if !self.state.accepts_moves() {
            return Err(RoomError::InvalidMove("the game is over".into()));
        }

        let (next, record) = G::apply_move(&self.game, input).map_err(RoomError::InvalidMove)?;
        self.game = next;
        let board = G::board(&self.game);

        tracing::info!(room_id = %self.id, %conn_id, %side, mv = %record, "move applied");

        // A game-ending move announces the result ahead of the move itself.
        let outcome = G::outcome(&self.game);
        if outcome.is_terminal() {
            let (winner, reason) = match outcome {
                Outcome::Checkmate => (
                    self.slot(side).as_ref().map(|m| m.name.clone()),
                    GameOverReason::Checkmate,
                ),
                _ => (None, GameOverReason::Draw),
            };
            self.state = RoomState::Finished;
            tracing::info!(room_id = %self.id, ?reason, ?winner, "game over");
            self.gateway
                .send_to_room(&self.id, ServerEvent::GameOver { winner, reason }, None);
        }

        self.gateway.send_to_room(
            &self.id,
            ServerEvent::Move {
                mv: record,
                board: board.clone(),
            },
            None,
        );

        Ok(board)
    }

    /// Removes `conn_id` from the room.
    ///
    /// Leaving a room you're not in is not an error. When a departing
    /// player leaves fewer than the configured minimum, the room closes
    /// silently: every member is detached and nobody gets another event
    /// for it.
    pub fn leave(&mut self, conn_id: ConnectionId) -> Departure {
        match self.seat_of(conn_id) {
            Seat::Absent => Departure::NotMember,
            Seat::Spectator => {
                let Some(index) = self.spectators.iter().position(|m| m.id == conn_id) else {
                    return Departure::NotMember;
                };
                let spectator = self.spectators.remove(index);
                self.gateway.detach(&self.id, conn_id);
                tracing::info!(room_id = %self.id, %conn_id, "spectator left");
                self.gateway.send_to_room(
                    &self.id,
                    ServerEvent::SpectatorDisconnected {
                        spectator: spectator.info(),
                        spectators: self.spectator_infos(),
                    },
                    None,
                );
                Departure::Left(Role::Spectator)
            }
            Seat::Player(side) => {
                let departed = self.slot_mut(side).take();
                self.gateway.detach(&self.id, conn_id);
                tracing::info!(room_id = %self.id, %conn_id, %side, "player left");

                if self.player_count() < self.config.effective_min_players() {
                    self.shut_down();
                    return Departure::Closed;
                }
                if self.state == RoomState::Active {
                    self.state = RoomState::Forming;
                }
                if let Some(player) = departed {
                    self.gateway.send_to_room(
                        &self.id,
                        ServerEvent::PlayerDisconnected {
                            player: player.info(),
                            role: side.into(),
                        },
                        None,
                    );
                }
                Departure::Left(side.into())
            }
        }
    }

    /// Closes the room on request: tells every member, then detaches
    /// them all.
    pub fn close(&mut self, requestor: ConnectionId) -> Result<(), RoomError> {
        if self.config.close_policy == ClosePolicy::MembersOnly
            && self.seat_of(requestor) == Seat::Absent
        {
            return Err(RoomError::NotAMember(requestor, self.id.clone()));
        }
        tracing::info!(room_id = %self.id, %requestor, "room close requested");
        self.gateway.send_to_room(
            &self.id,
            ServerEvent::CloseRoom {
                room_id: self.id.clone(),
            },
            None,
        );
        self.shut_down();
        Ok(())
    }

    fn shut_down(&mut self) {
        self.state = RoomState::Closed;
        let detached = self.gateway.detach_all(&self.id);
        tracing::info!(room_id = %self.id, detached = detached.len(), "room closed");
    }

    fn slot(&self, side: Side) -> &Option<Member> {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    fn slot_mut(&mut self, side: Side) -> &mut Option<Member> {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }

    fn members(&self) -> impl Iterator<Item = &Member> {
        self.white
            .iter()
            .chain(self.black.iter())
            .chain(self.spectators.iter())
    }

    fn spectator_infos(&self) -> Vec<ParticipantInfo> {
        self.spectators.iter().map(Member::info).collect()
    }
}
