use kingside::prelude::*;

// ---------------------------------------------------------------------------
// Game types
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cell {
    Empty,
    X,
    O,
}

#[derive(Clone, Debug)]
struct State {
    board: [[Cell; 3]; 3],
    placed: usize,
    outcome: Outcome,
}

// ---------------------------------------------------------------------------
// Game rules: X plays white, moves name a cell as "a1".."c3"
// ---------------------------------------------------------------------------

struct TicTacToe;

impl GameRules for TicTacToe {
    type State = State;

    fn initial_state() -> State {
        State {
            board: [[Cell::Empty; 3]; 3],
            placed: 0,
            outcome: Outcome::Ongoing,
        }
    }

    fn side_to_move(state: &State) -> Side {
        if state.placed % 2 == 0 { Side::White } else { Side::Black }
    }

    fn apply_move(state: &State, input: &str) -> Result<(State, String), String> {
        if state.outcome.is_terminal() {
            return Err("game is over".into());
        }
        let (row, col) = parse_cell(input)?;
        if state.board[row][col] != Cell::Empty {
            return Err(format!("{input} is occupied"));
        }

        let mark = match Self::side_to_move(state) {
            Side::White => Cell::X,
            Side::Black => Cell::O,
        };
        let mut next = state.clone();
        next.board[row][col] = mark;
        next.placed += 1;
        next.outcome = if check_winner(&next.board, mark) {
            Outcome::Checkmate
        } else if next.placed == 9 {
            Outcome::Draw
        } else {
            Outcome::Ongoing
        };

        let symbol = if mark == Cell::X { 'X' } else { 'O' };
        Ok((next, format!("{symbol}{}", input.to_ascii_lowercase())))
    }

    fn outcome(state: &State) -> Outcome {
        state.outcome
    }

    fn board(state: &State) -> String {
        state
            .board
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| match c {
                        Cell::Empty => '.',
                        Cell::X => 'X',
                        Cell::O => 'O',
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Parses "b3" into (row, col). Columns are a-c, rows 1-3 from the top.
fn parse_cell(input: &str) -> Result<(usize, usize), String> {
    let bytes = input.trim().as_bytes();
    let &[file, rank] = bytes else {
        return Err(format!("{input:?} is not a cell, use a1-c3"));
    };
    let col = match file.to_ascii_lowercase() {
        b @ b'a'..=b'c' => (b - b'a') as usize,
        _ => return Err(format!("{input:?} is not a cell, use a1-c3")),
    };
    let row = match rank {
        b @ b'1'..=b'3' => (b - b'1') as usize,
        _ => return Err(format!("{input:?} is not a cell, use a1-c3")),
    };
    Ok((row, col))
}

fn check_winner(b: &[[Cell; 3]; 3], m: Cell) -> bool {
    (0..3).any(|i| (0..3).all(|j| b[i][j] == m))
        || (0..3).any(|j| (0..3).all(|i| b[i][j] == m))
        || (0..3).all(|i| b[i][i] == m)
        || (0..3).all(|i| b[i][2 - i] == m)
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    kingside::telemetry::init_tracing("info");
    eprintln!("starting tic-tac-toe server on 0.0.0.0:8080");

    let server = KingsideServerBuilder::new()
        .bind("0.0.0.0:8080")
        .build::<TicTacToe>()
        .await?;

    server.run().await?;
    Ok(())
}
