//! Room actor: an isolated Tokio task that owns one room's membership
//! and its game.
//!
//! Each room runs in its own task and is driven entirely through an
//! mpsc command channel, so everything that happens inside one room —
//! joins, leaves, starts, game actions — is applied one at a time in
//! arrival order. No locks, no shared mutable state.

use std::collections::HashMap;

use quadline_engine::{GameAction, GameEngine, Participant};
use quadline_protocol::{
    GameSnapshot, PlayerId, PlayerSnapshot, RoomId, RoomSnapshot, ServerEvent,
};
use tokio::sync::{mpsc, oneshot};

use crate::RoomError;

/// Channel sender for delivering server events to a member's connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Identity details a room keeps per member. Join order is preserved:
/// it seeds the turn order when the game starts.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: PlayerId,
    pub name: String,
    pub created_at: u64,
}

/// Commands sent to a room actor through its channel.
///
/// Variants that need an answer carry a `oneshot::Sender` reply channel;
/// the caller awaits the response on the other end.
pub(crate) enum RoomCommand {
    /// Add a member to the room.
    Join {
        member: Member,
        sender: EventSender,
        reply: oneshot::Sender<Result<RoomSnapshot, RoomError>>,
    },

    /// Remove a member. Replies with the number of members remaining,
    /// so the lobby can delete the room when it hits zero.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    /// Start the game. `requested_by: None` is the system auto-start
    /// (room filled to capacity) and bypasses the admin check.
    StartGame {
        requested_by: Option<PlayerId>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Apply a game action for a member.
    Action {
        player_id: PlayerId,
        action: GameAction,
        reply: oneshot::Sender<Result<bool, RoomError>>,
    },

    /// Request the current game snapshot on behalf of a member.
    FetchGame {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<GameSnapshot, RoomError>>,
    },

    /// Request the room's metadata snapshot.
    Info {
        reply: oneshot::Sender<RoomSnapshot>,
    },

    /// Shut down the room.
    Shutdown,
}

/// Handle to a running room actor. Cheap to clone — just an
/// `mpsc::Sender` wrapper. The lobby holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Sends a join request to the room and awaits the updated snapshot.
    pub async fn join(
        &self,
        member: Member,
        sender: EventSender,
    ) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                member,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Closed(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Closed(self.room_id))?
    }

    /// Sends a leave request. Returns the number of members remaining.
    pub async fn leave(&self, player_id: PlayerId) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Closed(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Closed(self.room_id))?
    }

    /// Asks the room to start its game.
    pub async fn start_game(
        &self,
        requested_by: Option<PlayerId>,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::StartGame {
                requested_by,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Closed(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Closed(self.room_id))?
    }

    /// Applies a game action. Returns `true` if the action ended a round.
    pub async fn action(
        &self,
        player_id: PlayerId,
        action: GameAction,
    ) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Action {
                player_id,
                action,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Closed(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Closed(self.room_id))?
    }

    /// Fetches the current game snapshot for a member.
    pub async fn fetch_game(
        &self,
        player_id: PlayerId,
    ) -> Result<GameSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::FetchGame {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Closed(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Closed(self.room_id))?
    }

    /// Requests the room's metadata snapshot.
    pub async fn info(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Closed(self.room_id))?;
        reply_rx.await.map_err(|_| RoomError::Closed(self.room_id))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Closed(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    capacity: usize,
    /// The creator. Never reassigned, even if they leave: a room keeps
    /// its original admin for its whole lifetime, and an admin-less room
    /// simply can never be manually started again.
    admin: PlayerId,
    /// Members in join order.
    members: Vec<Member>,
    senders: HashMap<PlayerId, EventSender>,
    game: Option<GameEngine>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    member,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(member, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { player_id, reply } => {
                    let result = self.handle_leave(player_id);
                    let _ = reply.send(result);
                }
                RoomCommand::StartGame {
                    requested_by,
                    reply,
                } => {
                    let result = self.handle_start(requested_by);
                    let _ = reply.send(result);
                }
                RoomCommand::Action {
                    player_id,
                    action,
                    reply,
                } => {
                    let result = self.handle_action(player_id, action);
                    let _ = reply.send(result);
                }
                RoomCommand::FetchGame { player_id, reply } => {
                    let result = self.handle_fetch(player_id);
                    let _ = reply.send(result);
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_id = %self.room_id, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        member: Member,
        sender: EventSender,
    ) -> Result<RoomSnapshot, RoomError> {
        if self.game.is_some() {
            return Err(RoomError::AlreadyStarted(self.room_id));
        }
        if self.members.len() >= self.capacity {
            return Err(RoomError::AtCapacity(self.room_id));
        }

        let player_id = member.id.clone();
        self.senders.insert(player_id.clone(), sender);
        self.members.push(member);
        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            members = self.members.len(),
            "player joined room"
        );

        Ok(self.snapshot())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Result<usize, RoomError> {
        let pos = self
            .members
            .iter()
            .position(|m| m.id == player_id)
            .ok_or_else(|| RoomError::NotInRoom(player_id.clone(), self.room_id))?;
        self.members.remove(pos);
        self.senders.remove(&player_id);

        // A running game keeps the leaver's seat; only room membership
        // (and their event channel) goes away.
        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            members = self.members.len(),
            "player left room"
        );

        Ok(self.members.len())
    }

    fn handle_start(
        &mut self,
        requested_by: Option<PlayerId>,
    ) -> Result<(), RoomError> {
        if let Some(requester) = requested_by {
            if !self.is_member(&requester) {
                return Err(RoomError::NotInRoom(requester, self.room_id));
            }
            if requester != self.admin {
                return Err(RoomError::NotAdmin(requester, self.room_id));
            }
        }
        if self.game.is_some() {
            return Err(RoomError::AlreadyStarted(self.room_id));
        }
        if self.members.len() < 2 {
            return Err(RoomError::NotEnoughPlayers(self.room_id));
        }

        let participants: Vec<Participant> = self
            .members
            .iter()
            .map(|m| Participant {
                id: m.id.clone(),
                name: m.name.clone(),
                created_at: m.created_at,
            })
            .collect();

        let game = GameEngine::new(participants)?;
        tracing::info!(
            room_id = %self.room_id,
            players = self.members.len(),
            "game started"
        );

        self.game = Some(game);
        self.broadcast_game_data();
        Ok(())
    }

    fn handle_action(
        &mut self,
        player_id: PlayerId,
        action: GameAction,
    ) -> Result<bool, RoomError> {
        if !self.is_member(&player_id) {
            return Err(RoomError::NotAuthorized(player_id, self.room_id));
        }
        let game = self
            .game
            .as_mut()
            .ok_or(RoomError::NoGame(self.room_id))?;

        let round_ended = game.execute_action(&player_id, action)?;
        self.broadcast_game_data();
        Ok(round_ended)
    }

    fn handle_fetch(
        &self,
        player_id: PlayerId,
    ) -> Result<GameSnapshot, RoomError> {
        if !self.is_member(&player_id) {
            return Err(RoomError::NotAuthorized(player_id, self.room_id));
        }
        self.game
            .as_ref()
            .map(GameEngine::snapshot)
            .ok_or(RoomError::NoGame(self.room_id))
    }

    fn is_member(&self, player_id: &PlayerId) -> bool {
        self.members.iter().any(|m| m.id == *player_id)
    }

    /// Pushes the current game state to every connected member.
    fn broadcast_game_data(&self) {
        let Some(game) = &self.game else { return };
        let event = ServerEvent::GameData {
            game: game.snapshot(),
        };
        for member in &self.members {
            if let Some(sender) = self.senders.get(&member.id) {
                // A dead receiver just means the member disconnected.
                let _ = sender.send(event.clone());
            }
        }
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.room_id,
            admin: self.admin.clone(),
            players: self
                .members
                .iter()
                .map(|m| PlayerSnapshot {
                    id: m.id.clone(),
                    name: m.name.clone(),
                    created_at: m.created_at,
                    room_id: Some(self.room_id),
                })
                .collect(),
            can_start_game: self.members.len() > 1,
            is_full_capacity: self.members.len() == self.capacity,
            is_game_started: self.game.is_some(),
        }
    }
}

/// Spawns a new room actor task with its creator as admin and first
/// member, and returns a handle to communicate with it.
pub(crate) fn spawn_room(
    room_id: RoomId,
    capacity: usize,
    admin: Member,
    admin_sender: EventSender,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let mut senders = HashMap::new();
    senders.insert(admin.id.clone(), admin_sender);

    let actor = RoomActor {
        room_id,
        capacity,
        admin: admin.id.clone(),
        members: vec![admin],
        senders,
        game: None,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
