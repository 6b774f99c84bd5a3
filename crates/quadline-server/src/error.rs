//! Server-level error type.

use quadline_lobby::LobbyError;
use quadline_protocol::ProtocolError;

/// Top-level errors for binding, accepting, and serving connections.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("lobby error: {0}")]
    Lobby(#[from] LobbyError),
}
