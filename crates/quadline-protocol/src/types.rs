//! Core protocol types for Quadline's wire format.
//!
//! Everything here travels "on the wire": commands sent by clients,
//! events broadcast by the server, and the snapshot DTOs that describe
//! entities (players, rooms, games) to subscribers. The core never leaks
//! internal-only state — snapshots carry exactly the declared attribute
//! set of each entity.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Newtype over an opaque string: the transport assigns one per
/// connection (there is no account system — the connection *is* the
/// identity). `#[serde(transparent)]` serializes it as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Creates a player id from anything stringy.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A unique identifier for a room.
///
/// Rooms get a fresh UUID v4 at creation time, so ids are unguessable
/// and never reused within a process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub Uuid);

impl RoomId {
    /// Allocates a fresh random room id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The per-round color assigned to each participant.
///
/// Color doubles as seat order: the palette below is also the turn-order
/// palette, so whoever holds `Red` in a round always acts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
}

/// The fixed palette, in turn-order position. Index 0 goes first.
pub const COLOR_PALETTE: [Color; 4] =
    [Color::Red, Color::Green, Color::Blue, Color::Yellow];

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Red => "RED",
            Self::Green => "GREEN",
            Self::Blue => "BLUE",
            Self::Yellow => "YELLOW",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Snapshot DTOs
// ---------------------------------------------------------------------------

/// A player as seen by subscribers: identity plus room affiliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    /// Unix timestamp (seconds) of when the player connected.
    pub created_at: u64,
    pub room_id: Option<RoomId>,
}

/// A room as seen by subscribers.
///
/// The derived flags (`can_start_game`, `is_full_capacity`,
/// `is_game_started`) are included so clients never have to re-derive
/// lobby rules from raw counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub admin: PlayerId,
    pub players: Vec<PlayerSnapshot>,
    pub can_start_game: bool,
    pub is_full_capacity: bool,
    pub is_game_started: bool,
}

/// A game participant for the current round: identity plus the round
/// attributes (color, unplaced pieces).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub created_at: u64,
    pub color: Color,
    pub pieces_left: u8,
}

/// The full game state as broadcast to room members after every action.
///
/// `board` is a grid of cell stacks, bottom→top; only the last color of
/// each stack is "live" for ownership purposes. `turn_order` is the
/// rotating seat sequence; `current_turn` indexes into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub state: GameStatus,
    pub winners: Vec<Vec<PlayerId>>,
    pub board: Vec<Vec<Vec<Color>>>,
    pub turn_order: Vec<PlayerId>,
    pub players: HashMap<PlayerId, ParticipantSnapshot>,
    pub current_turn: usize,
    pub current_round: u32,
}

/// Whether a game is still accepting actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    InProgress,
    GameOver,
}

// ---------------------------------------------------------------------------
// ClientCommand — what clients send
// ---------------------------------------------------------------------------

/// A command from a connected client.
///
/// `#[serde(tag = "type")]` gives internally tagged JSON, e.g.
/// `{ "type": "JoinRoom", "room_id": "..." }` — the flat shape browser
/// clients find easiest to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    /// Register with the lobby under a display name.
    JoinLobby { name: String },

    /// Leave the lobby (and implicitly any room).
    LeaveLobby,

    /// Create a new room with the sender as admin and sole member.
    CreateRoom,

    /// Join an existing room.
    JoinRoom { room_id: RoomId },

    /// Leave a room the sender currently belongs to.
    LeaveRoom { room_id: RoomId },

    /// Start the game (admin only).
    StartGame { room_id: RoomId },

    /// Request the current game state for a room (members only).
    FetchGame { room_id: RoomId },

    /// Move the top piece of one cell onto another cell.
    Move {
        room_id: RoomId,
        from_row: usize,
        from_col: usize,
        to_row: usize,
        to_col: usize,
    },

    /// Place `num_pieces` unplaced pieces onto a cell.
    Place {
        room_id: RoomId,
        row: usize,
        col: usize,
        num_pieces: u8,
    },
}

// ---------------------------------------------------------------------------
// ServerEvent — what the server sends back
// ---------------------------------------------------------------------------

/// An event delivered to one or more clients.
///
/// Lobby-wide events carry the full room list so every subscriber can
/// re-render without follow-up queries. `GameData` is room-scoped and
/// only ever reaches members of that room. `InvalidRequest` goes only to
/// the client whose command failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Requester only: your registered identity.
    Welcome { player: PlayerSnapshot },

    /// Broadcast: a player joined the lobby.
    LobbyJoined { rooms: Vec<RoomSnapshot> },

    /// Broadcast: a player left the lobby.
    LobbyLeft { rooms: Vec<RoomSnapshot> },

    /// Broadcast: a room was created.
    RoomCreated {
        rooms: Vec<RoomSnapshot>,
        selected_room_id: RoomId,
    },

    /// Broadcast: a player joined a room.
    RoomJoined {
        rooms: Vec<RoomSnapshot>,
        selected_room_id: RoomId,
    },

    /// Broadcast: a player left a room.
    RoomLeft { rooms: Vec<RoomSnapshot> },

    /// Broadcast: a room's game started.
    GameStarted { rooms: Vec<RoomSnapshot> },

    /// Room members only: updated game state.
    GameData { game: GameSnapshot },

    /// Requester only: the command failed.
    InvalidRequest { message: String },
}

// =========================================================================
// Tests
// =========================================================================
