//! Lobby-wide broadcast hub.
//!
//! Rooms push game state to their own members; everything else that
//! changes the lobby picture (joins, leaves, room lifecycle) goes to
//! every registered client through this hub, so all connected clients
//! can keep their room listing current without polling.

use std::collections::HashMap;

use quadline_lobby::EventSender;
use quadline_protocol::{PlayerId, ServerEvent};

#[derive(Default)]
pub(crate) struct Hub {
    senders: HashMap<PlayerId, EventSender>,
}

impl Hub {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a client's outbound channel. Called when the client
    /// joins the lobby.
    pub(crate) fn register(&mut self, player_id: PlayerId, sender: EventSender) {
        self.senders.insert(player_id, sender);
    }

    pub(crate) fn unregister(&mut self, player_id: &PlayerId) {
        self.senders.remove(player_id);
    }

    /// Sends an event to every registered client. Dead channels just
    /// mean the client is mid-disconnect; they are cleaned up by their
    /// own handler.
    pub(crate) fn broadcast(&self, event: &ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_broadcast_reaches_all_registered_clients() {
        let mut hub = Hub::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        hub.register(PlayerId::new("p1"), tx1);
        hub.register(PlayerId::new("p2"), tx2);

        hub.broadcast(&ServerEvent::LobbyJoined { rooms: vec![] });

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_unregistered_client_stops_receiving() {
        let mut hub = Hub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.register(PlayerId::new("p1"), tx);
        hub.unregister(&PlayerId::new("p1"));

        hub.broadcast(&ServerEvent::LobbyJoined { rooms: vec![] });

        assert!(rx.try_recv().is_err());
    }
}
