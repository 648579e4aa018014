//! Integration tests for the room system using a mock game.

use std::collections::HashMap;
use std::sync::Arc;

use kingside_protocol::{
    GameOverReason, Payload, Role, RoomId, RoomState, ServerEvent, Side,
};
use kingside_room::{
    ClosePolicy, Departure, GameRules, Outcome, OutboundReceiver, RoomConfig, RoomError,
    RoomManager,
};
use kingside_transport::ConnectionId;
use tokio::sync::mpsc;

// =========================================================================
// Mock game: moves are free text; "#" mates, "=" draws, "x?" is illegal.
// =========================================================================

struct NotationGame;

#[derive(Clone, Debug)]
struct NotationState {
    moves: Vec<String>,
    outcome: Outcome,
}

impl GameRules for NotationGame {
    type State = NotationState;

    fn initial_state() -> NotationState {
        NotationState {
            moves: Vec::new(),
            outcome: Outcome::Ongoing,
        }
    }

    fn side_to_move(state: &NotationState) -> Side {
        if state.moves.len() % 2 == 0 {
            Side::White
        } else {
            Side::Black
        }
    }

    fn apply_move(state: &NotationState, input: &str) -> Result<(NotationState, String), String> {
        if input.is_empty() || input.starts_with("x?") {
            return Err(format!("{input:?} is not a legal move"));
        }
        let mut next = state.clone();
        next.moves.push(input.to_string());
        next.outcome = match input.chars().last() {
            Some('#') => Outcome::Checkmate,
            Some('=') => Outcome::Draw,
            _ => Outcome::Ongoing,
        };
        Ok((next, input.to_string()))
    }

    fn outcome(state: &NotationState) -> Outcome {
        state.outcome
    }

    fn board(state: &NotationState) -> String {
        format!("after {} moves", state.moves.len())
    }
}

// =========================================================================
// Helper
// =========================================================================

fn cid(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

/// A manager plus one outbound queue per connection.
struct Lobby {
    mgr: Arc<RoomManager<NotationGame>>,
    inboxes: HashMap<u64, OutboundReceiver>,
}

impl Lobby {
    fn new(config: RoomConfig) -> Self {
        Self {
            mgr: Arc::new(RoomManager::new(config)),
            inboxes: HashMap::new(),
        }
    }

    fn connect(&mut self, id: u64) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.mgr.gateway().register(cid(id), tx);
        self.inboxes.insert(id, rx);
    }

    /// Drains everything queued for a connection so far.
    fn events(&mut self, id: u64) -> Vec<ServerEvent> {
        let rx = self.inboxes.get_mut(&id).expect("connected");
        let mut events = Vec::new();
        while let Ok(payload) = rx.try_recv() {
            if let Payload::Server(event) = payload {
                events.push(event);
            }
        }
        events
    }

    /// Full teardown for a connection, as the server does it.
    async fn disconnect(&mut self, id: u64) -> Vec<RoomId> {
        let closed = self.mgr.on_connection_disconnected(cid(id)).await;
        self.mgr.gateway().unregister(cid(id));
        closed
    }
}

/// Creates a room for magnus (1) with hikaru (2) seated as black.
async fn two_player_room(config: RoomConfig) -> (Lobby, RoomId) {
    let mut lobby = Lobby::new(config);
    lobby.connect(1);
    lobby.connect(2);
    let room = lobby.mgr.create_room(cid(1), "magnus").await;
    lobby.mgr.join(&room, cid(2), "hikaru").await.unwrap();
    lobby.events(1);
    (lobby, room)
}

// =========================================================================
// End-to-end scenario
// =========================================================================

#[tokio::test]
async fn test_full_game_scenario() {
    let mut lobby = Lobby::new(RoomConfig::default());
    for id in 1..=4 {
        lobby.connect(id);
    }

    // magnus creates; a second "magnus" is refused.
    let room = lobby.mgr.create_room(cid(1), "magnus").await;
    let conflict = lobby.mgr.join(&room, cid(2), "magnus").await;
    assert!(matches!(conflict, Err(RoomError::NameConflict { .. })));

    // hikaru takes black; magnus hears about it.
    let joined = lobby.mgr.join(&room, cid(2), "hikaru").await.unwrap();
    assert_eq!(joined.role, Role::Black);
    assert_eq!(joined.room.state, RoomState::Active);
    assert!(matches!(
        lobby.events(1).as_slice(),
        [ServerEvent::OpponentJoined { role: Role::Black, .. }]
    ));
    assert!(lobby.events(2).is_empty());

    // White moves; both players see it.
    let board = lobby.mgr.make_move(&room, cid(1), "e4").await.unwrap();
    assert_eq!(board, "after 1 moves");
    for id in [1, 2] {
        assert_eq!(
            lobby.events(id),
            vec![ServerEvent::Move { mv: "e4".into(), board: board.clone() }]
        );
    }

    // White again is out of turn.
    let out_of_turn = lobby.mgr.make_move(&room, cid(1), "d4").await;
    assert!(matches!(out_of_turn, Err(RoomError::NotYourTurn { to_move: Side::Black })));
    assert!(lobby.events(2).is_empty());

    // Black mates.
    lobby.mgr.make_move(&room, cid(2), "Qh4#").await.unwrap();
    let events = lobby.events(1);
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        ServerEvent::GameOver {
            winner: Some("hikaru".into()),
            reason: GameOverReason::Checkmate,
        }
    );
    assert!(matches!(&events[1], ServerEvent::Move { mv, .. } if mv == "Qh4#"));
    lobby.events(2);

    // A spectator arrives.
    let watcher = lobby.mgr.join(&room, cid(3), "judit").await.unwrap();
    assert_eq!(watcher.role, Role::Spectator);
    assert_eq!(watcher.room.state, RoomState::Finished);
    for id in [1, 2, 3] {
        assert!(matches!(
            lobby.events(id).as_slice(),
            [ServerEvent::SpectatorJoined { .. }]
        ));
    }

    // White drops: the room goes away without another word.
    let closed = lobby.disconnect(1).await;
    assert_eq!(closed, vec![room.clone()]);
    assert_eq!(lobby.mgr.room_count().await, 0);
    assert!(lobby.events(2).is_empty());
    assert!(lobby.events(3).is_empty());

    // Everything aimed at the old id now misses.
    assert!(matches!(
        lobby.mgr.join(&room, cid(4), "vishy").await,
        Err(RoomError::NotFound(_))
    ));
    assert!(matches!(
        lobby.mgr.make_move(&room, cid(2), "e5").await,
        Err(RoomError::NotFound(_))
    ));
}

// =========================================================================
// Departures
// =========================================================================

#[tokio::test]
async fn test_player_leave_with_min_one_emits_single_disconnect_event() {
    let config = RoomConfig { min_players: 1, ..RoomConfig::default() };
    let (mut lobby, room) = two_player_room(config).await;

    let departure = lobby.mgr.leave(&room, cid(1)).await;

    assert_eq!(departure, Departure::Left(Role::White));
    let snapshot = lobby.mgr.room_snapshot(&room).await.unwrap();
    assert!(snapshot.white.is_none());
    assert!(snapshot.black.is_some());
    assert_eq!(snapshot.state, RoomState::Forming);

    // Repeated signals change nothing.
    lobby.disconnect(1).await;
    lobby.mgr.leave(&room, cid(1)).await;

    let events = lobby.events(2);
    let disconnects = events
        .iter()
        .filter(|e| matches!(e, ServerEvent::PlayerDisconnected { .. }))
        .count();
    assert_eq!(disconnects, 1, "got {events:?}");
}

#[tokio::test]
async fn test_repeated_disconnect_deletes_room_once() {
    let (mut lobby, room) = two_player_room(RoomConfig::default()).await;

    let first = lobby.mgr.on_connection_disconnected(cid(1)).await;
    let second = lobby.mgr.on_connection_disconnected(cid(1)).await;
    let third = lobby.mgr.on_connection_disconnected(cid(2)).await;

    assert_eq!(first, vec![room]);
    assert!(second.is_empty());
    assert!(third.is_empty());
    assert_eq!(lobby.mgr.room_count().await, 0);
    assert!(lobby.events(2).is_empty());
}

#[tokio::test]
async fn test_spectator_leave_keeps_room_open() {
    let (mut lobby, room) = two_player_room(RoomConfig::default()).await;
    lobby.connect(3);
    lobby.mgr.join(&room, cid(3), "judit").await.unwrap();
    lobby.events(1);

    lobby.disconnect(3).await;

    assert_eq!(lobby.mgr.room_count().await, 1);
    assert!(matches!(
        lobby.events(1).as_slice(),
        [ServerEvent::SpectatorDisconnected { spectators, .. }] if spectators.is_empty()
    ));
}

// =========================================================================
// Close
// =========================================================================

#[tokio::test]
async fn test_close_room_notifies_and_then_not_found() {
    let (mut lobby, room) = two_player_room(RoomConfig::default()).await;

    lobby.mgr.close_room(&room, cid(2)).await.unwrap();

    for id in [1, 2] {
        assert_eq!(
            lobby.events(id),
            vec![ServerEvent::CloseRoom { room_id: room.clone() }]
        );
    }
    assert!(matches!(
        lobby.mgr.close_room(&room, cid(2)).await,
        Err(RoomError::NotFound(_))
    ));
    assert!(lobby.mgr.gateway().members(&room).is_empty());
}

#[tokio::test]
async fn test_close_room_members_only_refuses_outsider() {
    let config = RoomConfig {
        close_policy: ClosePolicy::MembersOnly,
        ..RoomConfig::default()
    };
    let (mut lobby, room) = two_player_room(config).await;

    let refused = lobby.mgr.close_room(&room, cid(9)).await;

    assert!(matches!(refused, Err(RoomError::NotAMember(..))));
    assert_eq!(lobby.mgr.room_count().await, 1);
    assert!(lobby.events(1).is_empty());
    assert!(lobby.mgr.close_room(&room, cid(1)).await.is_ok());
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_moves_are_serialized() {
    let (lobby, room) = two_player_room(RoomConfig::default()).await;

    let mut tasks = Vec::new();
    for n in 0..8 {
        let mgr = Arc::clone(&lobby.mgr);
        let room = room.clone();
        tasks.push(tokio::spawn(async move {
            mgr.make_move(&room, cid(1), &format!("m{n}")).await
        }));
    }
    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(RoomError::NotYourTurn { .. }) => {}
            Err(other) => panic!("unexpected error {other}"),
        }
    }

    assert_eq!(accepted, 1);
    let snapshot = lobby.mgr.room_snapshot(&room).await.unwrap();
    assert_eq!(snapshot.board, "after 1 moves");
    assert_eq!(snapshot.turn, Side::Black);
}

#[tokio::test]
async fn test_rooms_are_independent() {
    let mut lobby = Lobby::new(RoomConfig::default());
    lobby.connect(1);
    lobby.connect(2);
    let a = lobby.mgr.create_room(cid(1), "magnus").await;
    let b = lobby.mgr.create_room(cid(2), "hikaru").await;

    assert_ne!(a, b);
    lobby.mgr.make_move(&a, cid(1), "e4").await.unwrap();

    assert!(lobby.events(2).is_empty());
    let snapshot = lobby.mgr.room_snapshot(&b).await.unwrap();
    assert_eq!(snapshot.board, "after 0 moves");
}

#[tokio::test]
async fn test_invalid_move_reports_reason_and_keeps_turn() {
    let (mut lobby, room) = two_player_room(RoomConfig::default()).await;

    let result = lobby.mgr.make_move(&room, cid(1), "x?e9").await;

    assert!(matches!(result, Err(RoomError::InvalidMove(reason)) if reason.contains("x?e9")));
    assert!(lobby.events(2).is_empty());
    assert!(lobby.mgr.make_move(&room, cid(1), "e4").await.is_ok());
}
