//! Error types for the game engine.

use quadline_protocol::PlayerId;

/// Errors that can occur while constructing a game or executing an
/// action. All are caller-recoverable; none leave the engine in a
/// partially mutated state.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// A game needs 2–4 participants.
    #[error("a game needs 2-4 players, got {0}")]
    InvalidPlayerCount(usize),

    /// The acting player is not a participant of this game.
    #[error("player {0} is not part of this game")]
    UnknownParticipant(PlayerId),

    /// The acting player is not the one whose turn it is.
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    /// A coordinate lies outside the 4×4 grid.
    #[error("coordinate ({row}, {col}) is off the board")]
    OutOfBounds { row: usize, col: usize },

    /// A move tried to pop from a cell with no pieces.
    #[error("cell ({row}, {col}) is empty, nothing to move")]
    EmptyCell { row: usize, col: usize },
}
