//! Lobby-side player records.

use std::time::{SystemTime, UNIX_EPOCH};

use quadline_protocol::{PlayerId, PlayerSnapshot, RoomId};

/// A player known to the lobby.
///
/// `room_id` is the lobby's side of the player↔room consistency
/// invariant: it is set only after a room actor confirms the join and
/// cleared only after the actor confirms the leave.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub created_at: u64,
    pub room_id: Option<RoomId>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            created_at: unix_timestamp(),
            room_id: None,
        }
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            room_id: self.room_id,
        }
    }
}

/// Seconds since the Unix epoch.
pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_has_no_room() {
        let player = Player::new(PlayerId::new("p1"), "alice");
        assert!(player.room_id.is_none());
        assert!(player.created_at > 0);
    }

    #[test]
    fn test_snapshot_carries_room_assignment() {
        let mut player = Player::new(PlayerId::new("p1"), "alice");
        let room = RoomId::random();
        player.room_id = Some(room);

        let snap = player.snapshot();
        assert_eq!(snap.id, PlayerId::new("p1"));
        assert_eq!(snap.name, "alice");
        assert_eq!(snap.room_id, Some(room));
    }
}
