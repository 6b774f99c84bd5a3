//! The lobby: player registry and room lifecycle orchestration.
//!
//! The lobby owns the player↔room consistency invariant. A player's
//! `room_id` is only set after the room actor confirms a join and only
//! cleared after it confirms a leave, so the lobby index never points
//! into a room that disagrees. Callers serialize structural changes by
//! holding the lobby behind a single async mutex (see the server crate).

use std::collections::HashMap;

use quadline_engine::GameAction;
use quadline_protocol::{GameSnapshot, PlayerId, PlayerSnapshot, RoomId, RoomSnapshot};

use crate::player::Player;
use crate::room::{spawn_room, EventSender, Member, RoomHandle};
use crate::{LobbyError, RoomError};

/// Command channel size for room actors.
const ROOM_CHANNEL_SIZE: usize = 64;

/// A named lobby holding players and their rooms.
pub struct Lobby {
    name: String,
    /// Maximum members per room. A room auto-starts when it fills.
    room_capacity: usize,
    players: HashMap<PlayerId, Player>,
    rooms: HashMap<RoomId, RoomHandle>,
}

impl Lobby {
    pub fn new(name: impl Into<String>, room_capacity: usize) -> Self {
        Self {
            name: name.into(),
            room_capacity,
            players: HashMap::new(),
            rooms: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn room_capacity(&self) -> usize {
        self.room_capacity
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn player(&self, id: &PlayerId) -> Option<PlayerSnapshot> {
        self.players.get(id).map(Player::snapshot)
    }

    /// Registers a player. Re-joining under the same id replaces the
    /// old record.
    pub fn join_lobby(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
    ) -> PlayerSnapshot {
        let player = Player::new(id.clone(), name);
        let snapshot = player.snapshot();
        self.players.insert(id.clone(), player);
        tracing::info!(player_id = %id, players = self.players.len(), "player joined lobby");
        snapshot
    }

    /// Removes a player, first pulling them out of their room (and
    /// deleting the room if they were its last member).
    pub async fn leave_lobby(&mut self, id: &PlayerId) -> Result<(), LobbyError> {
        let room_id = self
            .players
            .get(id)
            .ok_or_else(|| LobbyError::PlayerNotFound(id.clone()))?
            .room_id;

        if let Some(room_id) = room_id {
            // Best effort: a closed room must not keep the player stuck
            // in the lobby.
            if let Err(error) = self.leave_room(id, room_id).await {
                tracing::warn!(
                    player_id = %id,
                    %room_id,
                    %error,
                    "could not cleanly leave room during lobby exit"
                );
            }
        }

        self.players.remove(id);
        tracing::info!(player_id = %id, players = self.players.len(), "player left lobby");
        Ok(())
    }

    /// Creates a room with the player as admin and first member.
    pub async fn create_room(
        &mut self,
        player_id: &PlayerId,
        sender: EventSender,
    ) -> Result<RoomSnapshot, LobbyError> {
        let player = self
            .players
            .get(player_id)
            .ok_or_else(|| LobbyError::PlayerNotFound(player_id.clone()))?;
        if let Some(current) = player.room_id {
            return Err(LobbyError::AlreadyInRoom(player_id.clone(), current));
        }

        let room_id = RoomId::random();
        let admin = Member {
            id: player.id.clone(),
            name: player.name.clone(),
            created_at: player.created_at,
        };
        let handle = spawn_room(
            room_id,
            self.room_capacity,
            admin,
            sender,
            ROOM_CHANNEL_SIZE,
        );

        let snapshot = handle.info().await?;
        self.rooms.insert(room_id, handle);
        if let Some(player) = self.players.get_mut(player_id) {
            player.room_id = Some(room_id);
        }

        tracing::info!(%room_id, admin = %player_id, "room created");
        Ok(snapshot)
    }

    /// Adds a player to an existing room.
    pub async fn join_room(
        &mut self,
        player_id: &PlayerId,
        room_id: RoomId,
        sender: EventSender,
    ) -> Result<RoomSnapshot, LobbyError> {
        let player = self
            .players
            .get(player_id)
            .ok_or_else(|| LobbyError::PlayerNotFound(player_id.clone()))?;
        if let Some(current) = player.room_id {
            return Err(LobbyError::AlreadyInRoom(player_id.clone(), current));
        }

        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(LobbyError::RoomNotFound(room_id))?;
        let member = Member {
            id: player.id.clone(),
            name: player.name.clone(),
            created_at: player.created_at,
        };

        let snapshot = handle.join(member, sender).await?;
        if let Some(player) = self.players.get_mut(player_id) {
            player.room_id = Some(room_id);
        }
        Ok(snapshot)
    }

    /// Removes a player from the room they are in. Deletes the room if
    /// it becomes empty.
    pub async fn leave_room(
        &mut self,
        player_id: &PlayerId,
        room_id: RoomId,
    ) -> Result<(), LobbyError> {
        self.check_membership(player_id, room_id)?;
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(LobbyError::RoomNotFound(room_id))?;

        let remaining = handle.leave(player_id.clone()).await?;
        if let Some(player) = self.players.get_mut(player_id) {
            player.room_id = None;
        }

        if remaining == 0 {
            if let Some(handle) = self.rooms.remove(&room_id) {
                let _ = handle.shutdown().await;
            }
            tracing::info!(%room_id, "empty room deleted");
        }
        Ok(())
    }

    /// Starts a room's game on behalf of its admin.
    pub async fn start_game(
        &mut self,
        player_id: &PlayerId,
        room_id: RoomId,
    ) -> Result<(), LobbyError> {
        self.check_membership(player_id, room_id)?;
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(LobbyError::RoomNotFound(room_id))?;
        handle.start_game(Some(player_id.clone())).await?;
        Ok(())
    }

    /// System-initiated start, used when a join fills a room to
    /// capacity. Skips the admin check.
    pub async fn auto_start(&mut self, room_id: RoomId) -> Result<(), LobbyError> {
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(LobbyError::RoomNotFound(room_id))?;
        handle.start_game(None).await?;
        Ok(())
    }

    /// Routes a game action to a room. The lobby only resolves the ids;
    /// the room actor rejects non-members with `NotAuthorized`. Returns
    /// `true` if the action ended a round.
    pub async fn route_action(
        &self,
        player_id: &PlayerId,
        room_id: RoomId,
        action: GameAction,
    ) -> Result<bool, LobbyError> {
        self.ensure_player(player_id)?;
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(LobbyError::RoomNotFound(room_id))?;
        Ok(handle.action(player_id.clone(), action).await?)
    }

    /// Fetches a room's current game snapshot. As with actions, the room
    /// actor enforces membership and answers `NotAuthorized` otherwise.
    pub async fn fetch_game(
        &self,
        player_id: &PlayerId,
        room_id: RoomId,
    ) -> Result<GameSnapshot, LobbyError> {
        self.ensure_player(player_id)?;
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(LobbyError::RoomNotFound(room_id))?;
        Ok(handle.fetch_game(player_id.clone()).await?)
    }

    /// Snapshots every live room, in a stable order. Rooms whose actor
    /// is gone are dropped from the index on the way.
    pub async fn list_rooms(&mut self) -> Vec<RoomSnapshot> {
        let mut snapshots = Vec::with_capacity(self.rooms.len());
        let mut dead = Vec::new();
        for (room_id, handle) in &self.rooms {
            match handle.info().await {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(RoomError::Closed(_)) => dead.push(*room_id),
                Err(_) => {}
            }
        }
        for room_id in dead {
            self.rooms.remove(&room_id);
            tracing::warn!(%room_id, "dropped dead room from index");
        }
        snapshots.sort_by_key(|s| s.id.0);
        snapshots
    }

    fn ensure_player(&self, player_id: &PlayerId) -> Result<(), LobbyError> {
        if self.players.contains_key(player_id) {
            Ok(())
        } else {
            Err(LobbyError::PlayerNotFound(player_id.clone()))
        }
    }

    /// Verifies the lobby's view: the player exists and is recorded in
    /// exactly the room the request names.
    fn check_membership(
        &self,
        player_id: &PlayerId,
        room_id: RoomId,
    ) -> Result<(), LobbyError> {
        let player = self
            .players
            .get(player_id)
            .ok_or_else(|| LobbyError::PlayerNotFound(player_id.clone()))?;
        match player.room_id {
            Some(current) if current == room_id => Ok(()),
            Some(current) => Err(LobbyError::RoomMismatch {
                player: player_id.clone(),
                requested: room_id,
                actual: current,
            }),
            None => Err(LobbyError::PlayerNotInRoom(player_id.clone())),
        }
    }
}
