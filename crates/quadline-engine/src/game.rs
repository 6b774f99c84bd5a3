//! The game engine: turn/round state machine, action application, and
//! win detection.
//!
//! A game runs a fixed number of rounds on a freshly reset board. Within
//! a round, participants act in turn order; a round ends the moment one
//! or more colors complete a 3-in-a-row line of top colors. Because
//! cells are stacks and a single move can uncover pieces, several colors
//! can complete lines simultaneously — that is a draw for the round, and
//! every matching participant is recorded as a winner.

use std::collections::{HashMap, HashSet};

use quadline_protocol::{COLOR_PALETTE, Color, GameSnapshot, GameStatus, PlayerId};

use crate::board::{self, Board, GRID_DIMENSION};
use crate::error::GameError;
use crate::player::{PIECES_PER_ROUND, Participant, RoundPlayer};

/// Rounds per game.
pub const MAX_ROUNDS: u32 = 5;

const MIN_PLAYERS: usize = 2;
const MAX_PLAYERS: usize = 4;

/// Whether the engine still accepts actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    InProgress,
    GameOver,
}

/// An action a participant can take on their turn.
///
/// There is deliberately no adjacency or distance constraint on `Move` —
/// any in-bounds source and destination are legal. Do not add one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameAction {
    /// Pop the top piece of the source cell and push it onto the
    /// destination cell. The piece keeps its color when moved.
    Move {
        from_row: usize,
        from_col: usize,
        to_row: usize,
        to_col: usize,
    },

    /// Push `num_pieces` of the actor's color onto a cell, if the stack
    /// stays within height 3.
    Place {
        row: usize,
        col: usize,
        num_pieces: u8,
    },
}

/// One game over a frozen set of 2–4 participants.
///
/// The participant list is captured at construction and never changes:
/// a player who leaves their room mid-game still occupies a seat in the
/// turn order here.
#[derive(Debug, Clone)]
pub struct GameEngine {
    state: GameState,
    board: Board,
    /// Participant ids in seat order. Rotates once per round (the last
    /// entrant moves to the front), never mid-round.
    turn_order: Vec<PlayerId>,
    players: HashMap<PlayerId, RoundPlayer>,
    /// Index into `turn_order`. Invariant: `< turn_order.len()`.
    current_turn: usize,
    current_round: u32,
    max_rounds: u32,
    /// Winner ids per completed round. A round with several entries was
    /// a simultaneous (drawn) win.
    winners: Vec<Vec<PlayerId>>,
}

impl GameEngine {
    /// Creates a game over the given participants and immediately starts
    /// the first round.
    ///
    /// # Errors
    /// Returns [`GameError::InvalidPlayerCount`] unless there are 2–4
    /// participants.
    pub fn new(participants: Vec<Participant>) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&participants.len()) {
            return Err(GameError::InvalidPlayerCount(participants.len()));
        }

        let mut turn_order = Vec::with_capacity(participants.len());
        let mut players = HashMap::with_capacity(participants.len());
        for participant in participants {
            turn_order.push(participant.id.clone());
            // Placeholder color; the first round start assigns real ones.
            players.insert(
                participant.id.clone(),
                RoundPlayer::new(participant, COLOR_PALETTE[0]),
            );
        }

        let mut game = Self {
            state: GameState::InProgress,
            board: Board::new(),
            turn_order,
            players,
            current_turn: 0,
            current_round: 0,
            max_rounds: MAX_ROUNDS,
            winners: Vec::new(),
        };
        game.start_new_round();
        Ok(game)
    }

    /// Advances to the next round, or ends the game after the last one.
    ///
    /// Rotates the seat order by moving the last entrant to the front
    /// (so who goes *first* changes every round), reassigns colors by
    /// seat position from the fixed palette, refills every participant's
    /// pieces, clears the board, and resets the turn index.
    pub fn start_new_round(&mut self) {
        self.current_round += 1;

        if self.current_round > self.max_rounds {
            self.state = GameState::GameOver;
            tracing::info!(
                rounds = self.max_rounds,
                "all rounds played, game over"
            );
            return;
        }

        if let Some(last) = self.turn_order.pop() {
            self.turn_order.insert(0, last);
        }
        for (seat, id) in self.turn_order.iter().enumerate() {
            // Every id in turn_order has an entry in players.
            if let Some(player) = self.players.get_mut(id) {
                player.color = COLOR_PALETTE[seat];
                player.pieces_left = PIECES_PER_ROUND;
            }
        }

        self.board.reset();
        self.current_turn = 0;

        tracing::info!(round = self.current_round, "round started");
    }

    /// Applies an action for a player.
    ///
    /// Returns `Ok(true)` if the action ended the round (a win was
    /// detected and the next round has already started), `Ok(false)`
    /// otherwise. When the game is already over the action is ignored
    /// silently: no state change, no error.
    ///
    /// A `Place` that would push a stack past height 3 (or spend pieces
    /// the player doesn't have) is a no-op on the board, but still
    /// advances the turn — a participant can waste a turn on an invalid
    /// placement.
    ///
    /// # Errors
    /// - [`GameError::UnknownParticipant`] — actor is not in this game
    /// - [`GameError::NotYourTurn`] — actor is not the current player
    /// - [`GameError::OutOfBounds`] — a coordinate is off the grid
    /// - [`GameError::EmptyCell`] — move from a cell with no pieces
    pub fn execute_action(
        &mut self,
        player_id: &PlayerId,
        action: GameAction,
    ) -> Result<bool, GameError> {
        if self.state == GameState::GameOver {
            return Ok(false);
        }

        let color = self
            .players
            .get(player_id)
            .ok_or_else(|| GameError::UnknownParticipant(player_id.clone()))?
            .color;
        if self.turn_order[self.current_turn] != *player_id {
            return Err(GameError::NotYourTurn(player_id.clone()));
        }

        let mut round_winners = Vec::new();
        match action {
            GameAction::Move {
                from_row,
                from_col,
                to_row,
                to_col,
            } => {
                check_bounds(from_row, from_col)?;
                check_bounds(to_row, to_col)?;
                let piece = self
                    .board
                    .cell_mut(from_row, from_col)
                    .pop()
                    .ok_or(GameError::EmptyCell {
                        row: from_row,
                        col: from_col,
                    })?;
                self.board.cell_mut(to_row, to_col).push(piece);
                round_winners = self.round_winners();
            }

            GameAction::Place {
                row,
                col,
                num_pieces,
            } => {
                check_bounds(row, col)?;
                let height = self.board.cell(row, col).len();
                let pieces_left = self
                    .players
                    .get(player_id)
                    .map(|p| p.pieces_left)
                    .unwrap_or(0);
                let fits = 3usize.saturating_sub(height) >= num_pieces as usize;
                if fits && num_pieces <= pieces_left {
                    let cell = self.board.cell_mut(row, col);
                    for _ in 0..num_pieces {
                        cell.push(color);
                    }
                    if let Some(player) = self.players.get_mut(player_id) {
                        player.pieces_left -= num_pieces;
                    }
                    round_winners = self.round_winners();
                }
                // Otherwise: silent no-op, falls through to the no-win
                // branch below so the turn is still consumed.
            }
        }

        if round_winners.is_empty() {
            self.current_turn = (self.current_turn + 1) % self.turn_order.len();
            Ok(false)
        } else {
            tracing::info!(
                round = self.current_round,
                winners = ?round_winners,
                "round won"
            );
            self.winners.push(round_winners);
            self.start_new_round();
            Ok(true)
        }
    }

    /// Participants whose current color completed a 3-in-a-row line,
    /// in turn-order sequence. Empty when nobody has won.
    fn round_winners(&self) -> Vec<PlayerId> {
        let winning = self.winning_colors();
        self.turn_order
            .iter()
            .filter(|id| {
                self.players
                    .get(*id)
                    .is_some_and(|p| winning.contains(&p.color))
            })
            .cloned()
            .collect()
    }

    /// Scans the whole grid for completed 3-cell lines of equal top
    /// colors.
    ///
    /// Every coordinate is visited as a line origin; a line runs right,
    /// down, down-right, or down-left from its origin, and is discarded
    /// entirely if its farthest cell leaves the grid. Skipping origins
    /// whose top color already won is pruning only — the result does not
    /// depend on scan order.
    fn winning_colors(&self) -> HashSet<Color> {
        let mut winning = HashSet::new();

        for row in 0..GRID_DIMENSION {
            for col in 0..GRID_DIMENSION {
                let top = match self.board.top(row, col) {
                    Some(color) => color,
                    None => continue,
                };
                if winning.contains(&top) {
                    continue;
                }

                for line in lines_from(row as isize, col as isize) {
                    let (far_row, far_col) = line[2];
                    if !board::in_bounds(far_row, far_col) {
                        continue;
                    }
                    let all_equal = line.iter().all(|&(r, c)| {
                        self.board.top(r as usize, c as usize) == Some(top)
                    });
                    if all_equal {
                        winning.insert(top);
                    }
                }
            }
        }

        winning
    }

    /// Serializes the full game state for broadcast to room members.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            state: match self.state {
                GameState::InProgress => GameStatus::InProgress,
                GameState::GameOver => GameStatus::GameOver,
            },
            winners: self.winners.clone(),
            board: self.board.to_grid(),
            turn_order: self.turn_order.clone(),
            players: self
                .players
                .iter()
                .map(|(id, p)| (id.clone(), p.snapshot()))
                .collect(),
            current_turn: self.current_turn,
            current_round: self.current_round,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    /// The id of the participant whose turn it is.
    pub fn current_player(&self) -> &PlayerId {
        &self.turn_order[self.current_turn]
    }

    pub fn turn_order(&self) -> &[PlayerId] {
        &self.turn_order
    }

    pub fn winners(&self) -> &[Vec<PlayerId>] {
        &self.winners
    }

    pub fn player(&self, id: &PlayerId) -> Option<&RoundPlayer> {
        self.players.get(id)
    }
}

/// The four candidate 3-cell lines starting at an origin: row, column,
/// down-right diagonal, down-left diagonal. Coordinates are signed
/// because the down-left diagonal can leave the grid on the west side.
fn lines_from(row: isize, col: isize) -> [[(isize, isize); 3]; 4] {
    [
        [(row, col), (row, col + 1), (row, col + 2)],
        [(row, col), (row + 1, col), (row + 2, col)],
        [(row, col), (row + 1, col + 1), (row + 2, col + 2)],
        [(row, col), (row + 1, col - 1), (row + 2, col - 2)],
    ]
}

fn check_bounds(row: usize, col: usize) -> Result<(), GameError> {
    if row >= GRID_DIMENSION || col >= GRID_DIMENSION {
        return Err(GameError::OutOfBounds { row, col });
    }
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================
