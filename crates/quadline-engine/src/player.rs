//! Per-round participant state.

use quadline_protocol::{Color, ParticipantSnapshot, PlayerId};

/// Pieces handed to every participant at the start of each round.
pub const PIECES_PER_ROUND: u8 = 5;

/// Identity details the engine needs about a participant. Captured once
/// at game creation; a player leaving the room later does not remove
/// their seat from the running game.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: PlayerId,
    pub name: String,
    pub created_at: u64,
}

/// A participant's state within the current round.
///
/// `color` and `pieces_left` are reassigned at every round boundary,
/// never mid-round.
#[derive(Debug, Clone)]
pub struct RoundPlayer {
    pub id: PlayerId,
    pub name: String,
    pub created_at: u64,
    pub color: Color,
    pub pieces_left: u8,
}

impl RoundPlayer {
    /// Seeds a round player from their identity. The color here is a
    /// placeholder; the first round start assigns the real one.
    pub(crate) fn new(participant: Participant, color: Color) -> Self {
        Self {
            id: participant.id,
            name: participant.name,
            created_at: participant.created_at,
            color,
            pieces_left: PIECES_PER_ROUND,
        }
    }

    pub fn snapshot(&self) -> ParticipantSnapshot {
        ParticipantSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            color: self.color,
            pieces_left: self.pieces_left,
        }
    }
}
