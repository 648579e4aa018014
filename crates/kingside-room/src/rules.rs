//! The `GameRules` trait: the move-legality collaborator.
//!
//! Kingside never decides whether a move is legal. A room owns the
//! authoritative game state and hands it to these functions; the rules
//! never keep a copy of their own.

use kingside_protocol::Side;

/// Whether a position has ended the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The game goes on.
    Ongoing,
    /// The side that just moved delivered mate.
    Checkmate,
    /// The game is drawn.
    Draw,
}

impl Outcome {
    /// Returns `true` for checkmate and draw.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

/// Move legality for a two-player, turn-based board game.
///
/// Implementations are pure: every method is a function of the state it
/// is given.
pub trait GameRules: Send + Sync + 'static {
    /// The full game position (board, side to move, clocks, history).
    type State: Send + 'static;

    /// The position a new room starts from.
    fn initial_state() -> Self::State;

    /// Which side may move next.
    fn side_to_move(state: &Self::State) -> Side;

    /// Applies a move written in the game's input notation.
    ///
    /// Returns the next position plus a human-readable record of the move
    /// (e.g. SAN for chess), or the reason the move was rejected.
    fn apply_move(state: &Self::State, input: &str) -> Result<(Self::State, String), String>;

    /// Reports whether `state` ends the game.
    fn outcome(state: &Self::State) -> Outcome;

    /// Renders the position for clients (FEN for chess).
    fn board(state: &Self::State) -> String;
}
