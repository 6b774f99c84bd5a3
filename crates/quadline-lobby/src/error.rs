//! Error types for the lobby and room layers.

use quadline_engine::GameError;
use quadline_protocol::{PlayerId, RoomId};

/// Errors produced by a room actor (or by failing to reach one).
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room's actor task is gone; the room no longer exists.
    #[error("room {0} is closed")]
    Closed(RoomId),

    /// A join was attempted on a room that already holds its maximum
    /// number of members.
    #[error("room {0} is at full capacity")]
    AtCapacity(RoomId),

    /// The player is not a member of this room.
    #[error("player {0} is not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// A member-only operation (game action, game fetch) was attempted
    /// by a non-member.
    #[error("player {0} is not authorized to act in room {1}")]
    NotAuthorized(PlayerId, RoomId),

    /// A start was requested by a member who is not the room admin.
    #[error("player {0} is not the admin of room {1}")]
    NotAdmin(PlayerId, RoomId),

    /// A start was requested with fewer than two members present.
    #[error("room {0} does not have enough players to start")]
    NotEnoughPlayers(RoomId),

    /// A start (or join) was attempted after the game already began.
    #[error("the game in room {0} has already started")]
    AlreadyStarted(RoomId),

    /// A game operation was attempted before any game was started.
    #[error("room {0} has no running game")]
    NoGame(RoomId),

    /// A game action was rejected by the engine.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Errors produced by lobby-level orchestration.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// No player with this id has joined the lobby.
    #[error("player {0} is not in the lobby")]
    PlayerNotFound(PlayerId),

    /// No room with this id exists.
    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),

    /// The player is not in any room.
    #[error("player {0} is not in any room")]
    PlayerNotInRoom(PlayerId),

    /// The player is in a room, but not the one the request named.
    #[error("player {player} is in room {actual}, not room {requested}")]
    RoomMismatch {
        player: PlayerId,
        requested: RoomId,
        actual: RoomId,
    },

    /// The player is already in a room; a player can be in at most one.
    #[error("player {0} is already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The room rejected the operation.
    #[error(transparent)]
    Room(#[from] RoomError),
}
