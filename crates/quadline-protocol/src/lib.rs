//! Wire protocol for Quadline.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`ClientCommand`], [`ServerEvent`], the snapshot DTOs,
//!   [`PlayerId`], [`RoomId`], [`Color`]) — everything that travels on
//!   the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while doing so.
//!
//! The protocol layer sits below everything else: it knows nothing about
//! rooms, turns, or connections — only message shapes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    COLOR_PALETTE, ClientCommand, Color, GameSnapshot, GameStatus,
    ParticipantSnapshot, PlayerId, PlayerSnapshot, RoomId, RoomSnapshot,
    ServerEvent,
};
