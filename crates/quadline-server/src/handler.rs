//! Per-connection handler: decode commands, drive the lobby, push
//! events back to clients.
//!
//! Every connection is assigned a fresh player id at accept time and
//! owns one outbound event channel. The handler splits the socket:
//! a writer task drains the event channel onto the sink while the
//! handler loop reads and dispatches commands. Room broadcasts and hub
//! broadcasts reach the client through the same event channel, so
//! direct replies and broadcasts share one ordered stream.
//!
//! Lock discipline: the lobby mutex is held only for the lobby
//! operation (plus the room listing every reply carries), the hub mutex
//! only for the broadcast, and never both at once.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use quadline_engine::GameAction;
use quadline_lobby::{EventSender, LobbyError};
use quadline_protocol::{ClientCommand, Codec, PlayerId, RoomId, ServerEvent};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::server::ServerState;
use crate::ServerError;

type Ws = WebSocketStream<TcpStream>;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    ws: Ws,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let player_id = PlayerId::new(uuid::Uuid::new_v4().to_string());
    tracing::info!(%player_id, "connection established");

    let (mut sink, mut stream) = ws.split();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Writer task: everything outbound goes through the event channel.
    let codec = state.codec;
    let writer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(error) => {
                    tracing::error!(%error, "failed to encode event");
                    continue;
                }
            };
            if sink.send(Message::Binary(bytes.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(msg) = stream.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(error) => {
                tracing::debug!(%player_id, %error, "recv error");
                break;
            }
        };
        let data = match msg {
            Message::Binary(data) => data.to_vec(),
            Message::Text(text) => text.as_bytes().to_vec(),
            Message::Close(_) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            // ping/pong/frame
            _ => continue,
        };

        let command: ClientCommand = match state.codec.decode(&data) {
            Ok(command) => command,
            Err(error) => {
                tracing::debug!(%player_id, %error, "failed to decode command");
                send(&events_tx, ServerEvent::InvalidRequest {
                    message: format!("malformed command: {error}"),
                });
                continue;
            }
        };

        dispatch(&state, &player_id, &events_tx, command).await;
    }

    // Disconnect cleanup: pull the player out of their room and the
    // lobby, as if they had left explicitly, and tell everyone else.
    let left = {
        let mut lobby = state.lobby.lock().await;
        match lobby.leave_lobby(&player_id).await {
            Ok(()) => Some(lobby.list_rooms().await),
            // The connection may close before the client ever joined.
            Err(LobbyError::PlayerNotFound(_)) => None,
            Err(error) => {
                tracing::warn!(%player_id, %error, "disconnect cleanup failed");
                None
            }
        }
    };
    {
        let mut hub = state.hub.lock().await;
        hub.unregister(&player_id);
        if let Some(rooms) = left {
            hub.broadcast(&ServerEvent::LobbyLeft { rooms });
        }
    }

    drop(events_tx);
    let _ = writer.await;
    tracing::info!(%player_id, "connection closed");
    Ok(())
}

/// Applies one client command and queues the resulting events: direct
/// replies to the requester's channel, lobby-wide changes through the
/// hub to every registered client.
async fn dispatch(
    state: &Arc<ServerState>,
    player_id: &PlayerId,
    events: &EventSender,
    command: ClientCommand,
) {
    match command {
        ClientCommand::JoinLobby { name } => {
            let (player, rooms) = {
                let mut lobby = state.lobby.lock().await;
                let player = lobby.join_lobby(player_id.clone(), name);
                (player, lobby.list_rooms().await)
            };
            send(events, ServerEvent::Welcome { player });
            let mut hub = state.hub.lock().await;
            hub.register(player_id.clone(), events.clone());
            hub.broadcast(&ServerEvent::LobbyJoined { rooms });
        }

        ClientCommand::LeaveLobby => {
            let result = {
                let mut lobby = state.lobby.lock().await;
                match lobby.leave_lobby(player_id).await {
                    Ok(()) => Ok(lobby.list_rooms().await),
                    Err(error) => Err(error),
                }
            };
            match result {
                Ok(rooms) => {
                    let event = ServerEvent::LobbyLeft { rooms };
                    // Leave the hub first so the broadcast skips the
                    // leaver, then confirm to them directly.
                    let mut hub = state.hub.lock().await;
                    hub.unregister(player_id);
                    hub.broadcast(&event);
                    drop(hub);
                    send(events, event);
                }
                Err(error) => send_invalid(events, player_id, error),
            }
        }

        ClientCommand::CreateRoom => {
            let result = {
                let mut lobby = state.lobby.lock().await;
                match lobby.create_room(player_id, events.clone()).await {
                    Ok(room) => Ok((room.id, lobby.list_rooms().await)),
                    Err(error) => Err(error),
                }
            };
            match result {
                Ok((selected_room_id, rooms)) => {
                    broadcast(
                        state,
                        ServerEvent::RoomCreated {
                            rooms,
                            selected_room_id,
                        },
                    )
                    .await;
                }
                Err(error) => send_invalid(events, player_id, error),
            }
        }

        ClientCommand::JoinRoom { room_id } => {
            let result = {
                let mut lobby = state.lobby.lock().await;
                match lobby
                    .join_room(player_id, room_id, events.clone())
                    .await
                {
                    Ok(room) => Ok((
                        lobby.list_rooms().await,
                        room.is_full_capacity,
                    )),
                    Err(error) => Err(error),
                }
            };
            match result {
                Ok((rooms, filled)) => {
                    // Announce the join before any auto-start
                    // broadcast, so the joiner sees RoomJoined first.
                    broadcast(
                        state,
                        ServerEvent::RoomJoined {
                            rooms,
                            selected_room_id: room_id,
                        },
                    )
                    .await;
                    // A join that fills the room starts the game on the
                    // spot, no admin involved. The lobby is told the
                    // same way an explicit start is, so listings flip
                    // to started everywhere.
                    if filled {
                        let started = {
                            let mut lobby = state.lobby.lock().await;
                            match lobby.auto_start(room_id).await {
                                Ok(()) => Some(lobby.list_rooms().await),
                                Err(error) => {
                                    tracing::warn!(
                                        %room_id,
                                        %error,
                                        "auto-start failed"
                                    );
                                    None
                                }
                            }
                        };
                        if let Some(rooms) = started {
                            broadcast(
                                state,
                                ServerEvent::GameStarted { rooms },
                            )
                            .await;
                        }
                    }
                }
                Err(error) => send_invalid(events, player_id, error),
            }
        }

        ClientCommand::LeaveRoom { room_id } => {
            let result = {
                let mut lobby = state.lobby.lock().await;
                match lobby.leave_room(player_id, room_id).await {
                    Ok(()) => Ok(lobby.list_rooms().await),
                    Err(error) => Err(error),
                }
            };
            match result {
                Ok(rooms) => {
                    broadcast(state, ServerEvent::RoomLeft { rooms }).await;
                }
                Err(error) => send_invalid(events, player_id, error),
            }
        }

        ClientCommand::StartGame { room_id } => {
            let result = {
                let mut lobby = state.lobby.lock().await;
                match lobby.start_game(player_id, room_id).await {
                    Ok(()) => Ok(lobby.list_rooms().await),
                    Err(error) => Err(error),
                }
            };
            match result {
                Ok(rooms) => {
                    // The room actor has already pushed the opening
                    // GameData to every member; this tells the rest of
                    // the lobby the room is no longer joinable.
                    broadcast(state, ServerEvent::GameStarted { rooms }).await;
                }
                Err(error) => send_invalid(events, player_id, error),
            }
        }

        ClientCommand::FetchGame { room_id } => {
            let result = {
                let lobby = state.lobby.lock().await;
                lobby.fetch_game(player_id, room_id).await
            };
            match result {
                Ok(game) => send(events, ServerEvent::GameData { game }),
                Err(error) => send_invalid(events, player_id, error),
            }
        }

        ClientCommand::Move {
            room_id,
            from_row,
            from_col,
            to_row,
            to_col,
        } => {
            route_action(
                state,
                player_id,
                events,
                room_id,
                GameAction::Move {
                    from_row,
                    from_col,
                    to_row,
                    to_col,
                },
            )
            .await;
        }

        ClientCommand::Place {
            room_id,
            row,
            col,
            num_pieces,
        } => {
            route_action(
                state,
                player_id,
                events,
                room_id,
                GameAction::Place {
                    row,
                    col,
                    num_pieces,
                },
            )
            .await;
        }
    }
}

/// Routes a game action to the player's room. Success needs no direct
/// reply: the room broadcasts the updated game state to every member.
async fn route_action(
    state: &Arc<ServerState>,
    player_id: &PlayerId,
    events: &EventSender,
    room_id: RoomId,
    action: GameAction,
) {
    let result = {
        let lobby = state.lobby.lock().await;
        lobby.route_action(player_id, room_id, action).await
    };
    if let Err(error) = result {
        send_invalid(events, player_id, error);
    }
}

async fn broadcast(state: &Arc<ServerState>, event: ServerEvent) {
    state.hub.lock().await.broadcast(&event);
}

fn send(events: &EventSender, event: ServerEvent) {
    // A dead writer just means the client is gone.
    let _ = events.send(event);
}

fn send_invalid(events: &EventSender, player_id: &PlayerId, error: LobbyError) {
    tracing::debug!(%player_id, %error, "request rejected");
    send(
        events,
        ServerEvent::InvalidRequest {
            message: error.to_string(),
        },
    );
}
