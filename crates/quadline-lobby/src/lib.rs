//! Lobby and room coordination for Quadline.
//!
//! The [`Lobby`] tracks players and the rooms they may create, join,
//! and leave. Each room is an independent actor task (see [`room`])
//! that owns its membership and, once started, its [`GameEngine`].
//!
//! [`GameEngine`]: quadline_engine::GameEngine

pub mod error;
pub mod lobby;
pub mod player;
pub mod room;

pub use error::{LobbyError, RoomError};
pub use lobby::Lobby;
pub use player::Player;
pub use room::{EventSender, Member, RoomHandle};
