//! Integration tests for the lobby/room system: membership rules,
//! room lifecycle, start conditions, and game action routing.

use quadline_engine::GameAction;
use quadline_lobby::{EventSender, Lobby, LobbyError, RoomError};
use quadline_protocol::{PlayerId, RoomId, ServerEvent};
use tokio::sync::mpsc::{self, UnboundedReceiver};

fn pid(s: &str) -> PlayerId {
    PlayerId::new(s)
}

fn sink() -> (EventSender, UnboundedReceiver<ServerEvent>) {
    mpsc::unbounded_channel()
}

/// Builds a lobby with one room holding `members` players, the first of
/// whom is the admin. Returns the per-member event receivers in the
/// same order.
async fn lobby_with_room(
    capacity: usize,
    members: &[&str],
) -> (Lobby, RoomId, Vec<UnboundedReceiver<ServerEvent>>) {
    let mut lobby = Lobby::new("test-lobby", capacity);
    let mut receivers = Vec::new();

    let admin = pid(members[0]);
    lobby.join_lobby(admin.clone(), members[0]);
    let (tx, rx) = sink();
    let room = lobby.create_room(&admin, tx).await.unwrap();
    receivers.push(rx);

    for name in &members[1..] {
        let id = pid(name);
        lobby.join_lobby(id.clone(), *name);
        let (tx, rx) = sink();
        lobby.join_room(&id, room.id, tx).await.unwrap();
        receivers.push(rx);
    }

    (lobby, room.id, receivers)
}

fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// =========================================================================
// Lobby membership
// =========================================================================

#[tokio::test]
async fn test_join_lobby_registers_player_without_room() {
    let mut lobby = Lobby::new("test-lobby", 4);
    let snap = lobby.join_lobby(pid("p1"), "alice");

    assert_eq!(snap.id, pid("p1"));
    assert_eq!(snap.name, "alice");
    assert!(snap.room_id.is_none());
    assert_eq!(lobby.player_count(), 1);
}

#[tokio::test]
async fn test_leave_lobby_removes_unknown_player_is_an_error() {
    let mut lobby = Lobby::new("test-lobby", 4);
    let result = lobby.leave_lobby(&pid("ghost")).await;
    assert!(matches!(result, Err(LobbyError::PlayerNotFound(_))));
}

// =========================================================================
// Room creation and membership
// =========================================================================

#[tokio::test]
async fn test_create_room_makes_creator_admin_and_member() {
    let (mut lobby, room_id, _rx) = lobby_with_room(4, &["p1"]).await;

    let rooms = lobby.list_rooms().await;
    assert_eq!(rooms.len(), 1);
    let room = &rooms[0];
    assert_eq!(room.id, room_id);
    assert_eq!(room.admin, pid("p1"));
    assert_eq!(room.players.len(), 1);
    assert_eq!(room.players[0].room_id, Some(room_id));
    assert!(!room.can_start_game);
    assert!(!room.is_full_capacity);
    assert!(!room.is_game_started);
}

#[tokio::test]
async fn test_create_room_while_in_a_room_is_rejected() {
    let (mut lobby, _room_id, _rx) = lobby_with_room(4, &["p1"]).await;

    let (tx, _rx2) = sink();
    let result = lobby.create_room(&pid("p1"), tx).await;
    assert!(matches!(result, Err(LobbyError::AlreadyInRoom(_, _))));
    assert_eq!(lobby.room_count(), 1);
}

#[tokio::test]
async fn test_join_room_beyond_capacity_is_rejected() {
    let (mut lobby, room_id, _rx) =
        lobby_with_room(4, &["p1", "p2", "p3", "p4"]).await;

    lobby.join_lobby(pid("p5"), "p5");
    let (tx, _rx5) = sink();
    let result = lobby.join_room(&pid("p5"), room_id, tx).await;

    assert!(matches!(
        result,
        Err(LobbyError::Room(RoomError::AtCapacity(_)))
    ));
    // The rejected player is still roomless.
    assert!(lobby.player(&pid("p5")).unwrap().room_id.is_none());
}

#[tokio::test]
async fn test_join_nonexistent_room_is_rejected() {
    let mut lobby = Lobby::new("test-lobby", 4);
    lobby.join_lobby(pid("p1"), "p1");

    let (tx, _rx) = sink();
    let result = lobby.join_room(&pid("p1"), RoomId::random(), tx).await;
    assert!(matches!(result, Err(LobbyError::RoomNotFound(_))));
}

#[tokio::test]
async fn test_last_member_leaving_deletes_the_room() {
    let (mut lobby, room_id, _rx) = lobby_with_room(4, &["p1"]).await;

    lobby.leave_room(&pid("p1"), room_id).await.unwrap();

    assert_eq!(lobby.room_count(), 0);
    assert!(lobby.list_rooms().await.is_empty());
    assert!(lobby.player(&pid("p1")).unwrap().room_id.is_none());
}

#[tokio::test]
async fn test_admin_leaving_does_not_reassign_admin() {
    let (mut lobby, room_id, _rx) = lobby_with_room(4, &["p1", "p2"]).await;

    lobby.leave_room(&pid("p1"), room_id).await.unwrap();

    let rooms = lobby.list_rooms().await;
    assert_eq!(rooms.len(), 1);
    // The room keeps its original admin even though they are gone.
    assert_eq!(rooms[0].admin, pid("p1"));
    assert_eq!(rooms[0].players.len(), 1);
    assert_eq!(rooms[0].players[0].id, pid("p2"));
}

#[tokio::test]
async fn test_leave_room_requires_matching_membership() {
    let (mut lobby, _room_id, _rx) = lobby_with_room(4, &["p1"]).await;

    // p2 is in the lobby but in no room.
    lobby.join_lobby(pid("p2"), "p2");
    let other = RoomId::random();
    assert!(matches!(
        lobby.leave_room(&pid("p2"), other).await,
        Err(LobbyError::PlayerNotInRoom(_))
    ));

    // p1 is in a room, but not the one named.
    assert!(matches!(
        lobby.leave_room(&pid("p1"), other).await,
        Err(LobbyError::RoomMismatch { .. })
    ));
}

#[tokio::test]
async fn test_leave_lobby_cascades_out_of_the_room() {
    let (mut lobby, _room_id, _rx) = lobby_with_room(4, &["p1", "p2"]).await;

    lobby.leave_lobby(&pid("p2")).await.unwrap();

    assert!(lobby.player(&pid("p2")).is_none());
    let rooms = lobby.list_rooms().await;
    assert_eq!(rooms[0].players.len(), 1);
    assert_eq!(rooms[0].players[0].id, pid("p1"));
}

#[tokio::test]
async fn test_leave_lobby_of_last_member_deletes_room_too() {
    let (mut lobby, _room_id, _rx) = lobby_with_room(4, &["p1"]).await;

    lobby.leave_lobby(&pid("p1")).await.unwrap();

    assert_eq!(lobby.player_count(), 0);
    assert_eq!(lobby.room_count(), 0);
}

// =========================================================================
// Starting games
// =========================================================================

#[tokio::test]
async fn test_start_game_by_non_admin_is_rejected() {
    let (mut lobby, room_id, _rx) = lobby_with_room(4, &["p1", "p2"]).await;

    let result = lobby.start_game(&pid("p2"), room_id).await;
    assert!(matches!(
        result,
        Err(LobbyError::Room(RoomError::NotAdmin(_, _)))
    ));
}

#[tokio::test]
async fn test_start_game_with_one_member_is_rejected() {
    let (mut lobby, room_id, _rx) = lobby_with_room(4, &["p1"]).await;

    let result = lobby.start_game(&pid("p1"), room_id).await;
    assert!(matches!(
        result,
        Err(LobbyError::Room(RoomError::NotEnoughPlayers(_)))
    ));
}

#[tokio::test]
async fn test_admin_start_broadcasts_game_data_to_all_members() {
    let (mut lobby, room_id, mut rxs) =
        lobby_with_room(4, &["p1", "p2", "p3"]).await;

    lobby.start_game(&pid("p1"), room_id).await.unwrap();

    for rx in &mut rxs {
        let events = drain(rx);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, ServerEvent::GameData { .. })),
            "every member should receive the initial game state"
        );
    }

    let rooms = lobby.list_rooms().await;
    assert!(rooms[0].is_game_started);
}

#[tokio::test]
async fn test_starting_twice_is_rejected() {
    let (mut lobby, room_id, _rx) = lobby_with_room(4, &["p1", "p2"]).await;
    lobby.start_game(&pid("p1"), room_id).await.unwrap();

    let result = lobby.start_game(&pid("p1"), room_id).await;
    assert!(matches!(
        result,
        Err(LobbyError::Room(RoomError::AlreadyStarted(_)))
    ));
}

#[tokio::test]
async fn test_joining_a_started_game_is_rejected() {
    let (mut lobby, room_id, _rx) = lobby_with_room(4, &["p1", "p2"]).await;
    lobby.start_game(&pid("p1"), room_id).await.unwrap();

    lobby.join_lobby(pid("p3"), "p3");
    let (tx, _rx3) = sink();
    let result = lobby.join_room(&pid("p3"), room_id, tx).await;
    assert!(matches!(
        result,
        Err(LobbyError::Room(RoomError::AlreadyStarted(_)))
    ));
}

#[tokio::test]
async fn test_auto_start_on_full_room_skips_admin_check() {
    let (mut lobby, room_id, mut rxs) = lobby_with_room(2, &["p1", "p2"]).await;

    let rooms = lobby.list_rooms().await;
    assert!(rooms[0].is_full_capacity);

    lobby.auto_start(room_id).await.unwrap();

    let rooms = lobby.list_rooms().await;
    assert!(rooms[0].is_game_started);
    for rx in &mut rxs {
        assert!(
            drain(rx)
                .iter()
                .any(|e| matches!(e, ServerEvent::GameData { .. }))
        );
    }
}

// =========================================================================
// Game routing
// =========================================================================

#[tokio::test]
async fn test_fetch_game_before_start_is_rejected() {
    let (lobby, room_id, _rx) = lobby_with_room(4, &["p1", "p2"]).await;

    let result = lobby.fetch_game(&pid("p1"), room_id).await;
    assert!(matches!(
        result,
        Err(LobbyError::Room(RoomError::NoGame(_)))
    ));
}

#[tokio::test]
async fn test_action_is_applied_and_broadcast() {
    let (mut lobby, room_id, mut rxs) = lobby_with_room(4, &["p1", "p2"]).await;
    lobby.start_game(&pid("p1"), room_id).await.unwrap();
    for rx in &mut rxs {
        drain(rx);
    }

    // Find whose turn it is from the game snapshot.
    let game = lobby.fetch_game(&pid("p1"), room_id).await.unwrap();
    let actor = game.turn_order[game.current_turn].clone();

    let ended = lobby
        .route_action(
            &actor,
            room_id,
            GameAction::Place {
                row: 1,
                col: 2,
                num_pieces: 2,
            },
        )
        .await
        .unwrap();
    assert!(!ended);

    // Every member sees the updated board.
    for rx in &mut rxs {
        let events = drain(rx);
        let updated = events.iter().find_map(|e| match e {
            ServerEvent::GameData { game } => Some(game),
            _ => None,
        });
        let updated = updated.expect("member missed the game update");
        assert_eq!(updated.board[1][2].len(), 2);
        assert_eq!(updated.current_turn, (game.current_turn + 1) % 2);
    }
}

#[tokio::test]
async fn test_action_from_out_of_turn_player_is_an_engine_error() {
    let (mut lobby, room_id, _rx) = lobby_with_room(4, &["p1", "p2"]).await;
    lobby.start_game(&pid("p1"), room_id).await.unwrap();

    let game = lobby.fetch_game(&pid("p1"), room_id).await.unwrap();
    let waiting = game
        .turn_order
        .iter()
        .find(|id| **id != game.turn_order[game.current_turn])
        .unwrap()
        .clone();

    let result = lobby
        .route_action(
            &waiting,
            room_id,
            GameAction::Place {
                row: 0,
                col: 0,
                num_pieces: 1,
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(LobbyError::Room(RoomError::Game(_)))
    ));
}

#[tokio::test]
async fn test_action_against_unknown_room_is_rejected() {
    let (mut lobby, room_id, _rx) = lobby_with_room(4, &["p1", "p2"]).await;
    lobby.start_game(&pid("p1"), room_id).await.unwrap();

    let result = lobby
        .route_action(
            &pid("p1"),
            RoomId::random(),
            GameAction::Place {
                row: 0,
                col: 0,
                num_pieces: 1,
            },
        )
        .await;
    assert!(matches!(result, Err(LobbyError::RoomNotFound(_))));
}

#[tokio::test]
async fn test_action_from_outside_the_room_is_not_authorized() {
    let (mut lobby, room_id, _rx) = lobby_with_room(4, &["p1", "p2"]).await;
    lobby.start_game(&pid("p1"), room_id).await.unwrap();

    // p3 is in the lobby but holds no seat in the room.
    lobby.join_lobby(pid("p3"), "p3");
    let result = lobby
        .route_action(
            &pid("p3"),
            room_id,
            GameAction::Place {
                row: 0,
                col: 0,
                num_pieces: 1,
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(LobbyError::Room(RoomError::NotAuthorized(_, _)))
    ));
}

#[tokio::test]
async fn test_game_data_is_for_members_only() {
    let (mut lobby, room_id, _rx) = lobby_with_room(4, &["p1", "p2"]).await;
    lobby.start_game(&pid("p1"), room_id).await.unwrap();

    lobby.join_lobby(pid("p3"), "p3");
    let result = lobby.fetch_game(&pid("p3"), room_id).await;
    assert!(matches!(
        result,
        Err(LobbyError::Room(RoomError::NotAuthorized(_, _)))
    ));

    // A member gets the snapshot.
    assert!(lobby.fetch_game(&pid("p2"), room_id).await.is_ok());
}

#[tokio::test]
async fn test_leaver_keeps_their_seat_in_a_running_game() {
    let (mut lobby, room_id, _rx) = lobby_with_room(4, &["p1", "p2"]).await;
    lobby.start_game(&pid("p1"), room_id).await.unwrap();

    lobby.leave_room(&pid("p2"), room_id).await.unwrap();

    // Room membership shrank, but the game still has both seats.
    let rooms = lobby.list_rooms().await;
    assert_eq!(rooms[0].players.len(), 1);
    let game = lobby.fetch_game(&pid("p1"), room_id).await.unwrap();
    assert_eq!(game.turn_order.len(), 2);
    assert_eq!(game.players.len(), 2);
}
