//! Scripted rules for unit tests.
//!
//! Any non-empty move is legal. A move ending in `#` mates, the move
//! `draw` draws, and a move starting with `?` is rejected.

use kingside_protocol::Side;

use crate::{GameRules, Outcome};

pub(crate) struct ScriptedRules;

#[derive(Debug, Clone)]
pub(crate) struct ScriptedState {
    pub(crate) moves: Vec<String>,
    pub(crate) to_move: Side,
    pub(crate) outcome: Outcome,
}

impl GameRules for ScriptedRules {
    type State = ScriptedState;

    fn initial_state() -> ScriptedState {
        ScriptedState {
            moves: Vec::new(),
            to_move: Side::White,
            outcome: Outcome::Ongoing,
        }
    }

    fn side_to_move(state: &ScriptedState) -> Side {
        state.to_move
    }

    fn apply_move(state: &ScriptedState, input: &str) -> Result<(ScriptedState, String), String> {
        let input = input.trim();
        if input.is_empty() || input.starts_with('?') {
            return Err(format!("illegal move {input:?}"));
        }
        let mut next = state.clone();
        next.moves.push(input.to_string());
        next.to_move = state.to_move.opponent();
        next.outcome = if input.ends_with('#') {
            Outcome::Checkmate
        } else if input == "draw" {
            Outcome::Draw
        } else {
            Outcome::Ongoing
        };
        Ok((next, input.to_string()))
    }

    fn outcome(state: &ScriptedState) -> Outcome {
        state.outcome
    }

    fn board(state: &ScriptedState) -> String {
        if state.moves.is_empty() {
            "start".to_string()
        } else {
            state.moves.join(" ")
        }
    }
}
