//! Game rules for Quadline: a 4×4 board of color stacks where 2–4
//! players race to line up three of their color's tops, over five
//! rounds with rotating seats and colors.
//!
//! The engine is purely synchronous and single-threaded; the room layer
//! owns one engine per started game and serializes access to it.

pub mod board;
pub mod error;
pub mod game;
pub mod player;

pub use board::{Board, Cell, GRID_DIMENSION};
pub use error::GameError;
pub use game::{GameAction, GameEngine, GameState, MAX_ROUNDS};
pub use player::{PIECES_PER_ROUND, Participant, RoundPlayer};
