//! `QuadlineServer`: the WebSocket accept loop and shared state.

use std::sync::Arc;

use quadline_lobby::Lobby;
use quadline_protocol::JsonCodec;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::hub::Hub;
use crate::{Config, ServerError};

/// Shared server state passed to each connection handler task.
///
/// The lobby sits behind a single async mutex: every structural change
/// (join/leave lobby, create/join/leave room) is serialized through it,
/// while per-room game traffic is serialized by each room's own actor
/// mailbox. The hub has its own mutex; the two are never held at once.
pub(crate) struct ServerState {
    pub(crate) lobby: Mutex<Lobby>,
    pub(crate) hub: Mutex<Hub>,
    pub(crate) codec: JsonCodec,
}

/// A bound, not-yet-running Quadline server.
pub struct QuadlineServer {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl QuadlineServer {
    /// Binds the listener and prepares the lobby.
    pub async fn bind(config: Config) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        tracing::info!(
            addr = %config.bind_addr,
            lobby = %config.lobby_name,
            room_capacity = config.room_capacity,
            "listening"
        );

        let state = Arc::new(ServerState {
            lobby: Mutex::new(Lobby::new(
                config.lobby_name,
                config.room_capacity,
            )),
            hub: Mutex::new(Hub::new()),
            codec: JsonCodec,
        });

        Ok(Self { listener, state })
    }

    /// The address the listener actually bound to. Useful with a `:0`
    /// bind in tests.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Each accepted connection gets the WebSocket handshake and then
    /// its own handler task.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        let ws = match tokio_tungstenite::accept_async(stream)
                            .await
                        {
                            Ok(ws) => ws,
                            Err(error) => {
                                tracing::debug!(
                                    %addr,
                                    %error,
                                    "websocket handshake failed"
                                );
                                return;
                            }
                        };
                        tracing::debug!(%addr, "accepted connection");
                        if let Err(error) =
                            handle_connection(ws, state).await
                        {
                            tracing::debug!(
                                %addr,
                                %error,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(error) => {
                    tracing::error!(%error, "accept failed");
                }
            }
        }
    }
}
