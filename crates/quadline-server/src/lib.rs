//! WebSocket server for Quadline.
//!
//! Ties the layers together: transport (tokio-tungstenite) → protocol
//! (tagged JSON commands/events) → lobby (player/room orchestration) →
//! engine (game rules). One lobby per process; one handler task per
//! connection; one actor task per room.

pub mod config;
pub mod error;
mod handler;
mod hub;
pub mod server;

pub use config::Config;
pub use error::ServerError;
pub use server::QuadlineServer;
