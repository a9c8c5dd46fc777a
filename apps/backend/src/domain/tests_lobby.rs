use super::caro::Symbol;
use super::events::RoomEvent;
use super::room::RoomStatus;
use super::test_helpers::{caro_room, join, ok, ready, started_race, step, sudoku_room, T0};
use super::transitions::RoomAction;
use crate::errors::ErrorCode;

#[test]
fn join_adds_player_and_emits_player_joined() {
    let applied = step(&sudoku_room(4), join("bob"), T0).unwrap();
    assert_eq!(applied.room.players.len(), 2);
    assert!(!applied.room.players[1].ready);
    assert!(matches!(
        applied.events[0].event,
        RoomEvent::PlayerJoined { ref player } if player.id == "bob"
    ));
}

#[test]
fn join_twice_is_idempotent() {
    let room = ok(&sudoku_room(4), join("bob"), T0);
    let again = step(&room, join("bob"), T0).unwrap();
    assert_eq!(again.room.players.len(), 2);
    assert!(again.events.is_empty());
    assert!(!again.changed(&room));
}

#[test]
fn rejoin_after_disconnect_reconnects_same_slot() {
    let room = ok(&sudoku_room(4), join("bob"), T0);
    let room = ok(
        &room,
        RoomAction::SetConnected {
            player_id: "bob".into(),
            connected: false,
        },
        T0,
    );
    let applied = step(&room, join("bob"), T0).unwrap();
    assert_eq!(applied.room.players.len(), 2);
    assert!(applied.room.player("bob").unwrap().connected);
    assert!(matches!(
        applied.events[0].event,
        RoomEvent::PlayerReconnected { .. }
    ));
}

#[test]
fn join_full_room_fails() {
    let room = ok(&sudoku_room(2), join("bob"), T0);
    let err = step(&room, join("carol"), T0).unwrap_err();
    assert_eq!(err.code(), ErrorCode::RoomFull);

    let caro = ok(&caro_room(), join("olga"), T0);
    assert_eq!(
        step(&caro, join("pete"), T0).unwrap_err().code(),
        ErrorCode::RoomFull
    );
}

#[test]
fn join_started_room_fails_but_member_rejoin_succeeds() {
    let room = started_race();
    assert_eq!(
        step(&room, join("carol"), T0).unwrap_err().code(),
        ErrorCode::GameAlreadyStarted
    );
    assert!(step(&room, join("bob"), T0).is_ok());
}

#[test]
fn join_finished_room_fails() {
    let room = started_race();
    let room = ok(
        &room,
        RoomAction::GiveUp {
            player_id: "alice".into(),
        },
        T0,
    );
    let room = ok(
        &room,
        RoomAction::GiveUp {
            player_id: "bob".into(),
        },
        T0,
    );
    assert!(room.is_finished());
    assert_eq!(
        step(&room, join("carol"), T0).unwrap_err().code(),
        ErrorCode::AlreadyFinished
    );
}

#[test]
fn member_rejoin_of_finished_room_succeeds() {
    let room = ok(
        &started_race(),
        RoomAction::GiveUp {
            player_id: "alice".into(),
        },
        T0,
    );
    let room = ok(
        &room,
        RoomAction::GiveUp {
            player_id: "bob".into(),
        },
        T0,
    );
    let again = step(&room, join("bob"), T0).unwrap();
    assert!(again.events.is_empty());
    assert!(!again.changed(&room));
}

#[test]
fn caro_joiner_gets_o() {
    let room = ok(&caro_room(), join("olga"), T0);
    assert_eq!(room.player("olga").unwrap().symbol(), Some(Symbol::O));
}

#[test]
fn host_cannot_toggle_ready() {
    let err = step(&sudoku_room(4), ready("alice"), T0).unwrap_err();
    assert_eq!(err.code(), ErrorCode::HostAlwaysReady);
}

#[test]
fn ready_requires_membership() {
    let err = step(&sudoku_room(4), ready("mallory"), T0).unwrap_err();
    assert_eq!(err.code(), ErrorCode::PlayerNotInRoom);
}

#[test]
fn start_requires_host() {
    let room = ok(&sudoku_room(4), join("bob"), T0);
    let room = ok(&room, ready("bob"), T0);
    let err = step(
        &room,
        RoomAction::Start {
            player_id: "bob".into(),
            puzzle: None,
        },
        T0,
    )
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotHost);
}

#[test]
fn start_requires_ready_guest() {
    let alone = sudoku_room(4);
    let start = RoomAction::Start {
        player_id: "alice".into(),
        puzzle: None,
    };
    assert_eq!(
        step(&alone, start.clone(), T0).unwrap_err().code(),
        ErrorCode::NotReady
    );
    let unready = ok(&alone, join("bob"), T0);
    assert_eq!(
        step(&unready, start, T0).unwrap_err().code(),
        ErrorCode::NotReady
    );

    let caro = ok(&caro_room(), join("olga"), T0);
    assert_eq!(
        step(
            &caro,
            RoomAction::Start {
                player_id: "xavier".into(),
                puzzle: None
            },
            T0
        )
        .unwrap_err()
        .code(),
        ErrorCode::NotReady
    );
}

#[test]
fn start_emits_countdown_then_snapshot() {
    let room = ok(&caro_room(), join("olga"), T0);
    let room = ok(&room, ready("olga"), T0);
    let applied = step(
        &room,
        RoomAction::Start {
            player_id: "xavier".into(),
            puzzle: None,
        },
        T0,
    )
    .unwrap();
    assert!(matches!(
        applied.events[0].event,
        RoomEvent::GameStarting { countdown: 3 }
    ));
    assert!(matches!(applied.events[1].event, RoomEvent::GameStarted { .. }));
    assert!(matches!(applied.room.status, RoomStatus::Playing { .. }));
}

#[test]
fn rejected_action_leaves_room_untouched() {
    let room = ok(&sudoku_room(2), join("bob"), T0);
    let before = room.clone();
    assert!(step(&room, join("carol"), T0).is_err());
    assert_eq!(room, before);
}

#[test]
fn host_leaving_transfers_host() {
    let room = ok(&sudoku_room(4), join("bob"), T0);
    let applied = step(
        &room,
        RoomAction::Leave {
            player_id: "alice".into(),
        },
        T0,
    )
    .unwrap();
    assert_eq!(applied.room.host_id, "bob");
    assert!(applied.room.players[0].ready);
    assert!(!applied.deleted);
    assert!(matches!(
        applied.events[0].event,
        RoomEvent::PlayerLeft { ref new_host, .. } if new_host.as_deref() == Some("bob")
    ));
}

#[test]
fn last_player_leaving_deletes_room() {
    let applied = step(
        &sudoku_room(4),
        RoomAction::Leave {
            player_id: "alice".into(),
        },
        T0,
    )
    .unwrap();
    assert!(applied.deleted);
}

#[test]
fn leave_requires_membership() {
    let err = step(
        &sudoku_room(4),
        RoomAction::Leave {
            player_id: "ghost".into(),
        },
        T0,
    )
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PlayerNotInRoom);
}

#[test]
fn set_connected_is_edge_triggered() {
    let room = ok(&sudoku_room(4), join("bob"), T0);
    let same = step(
        &room,
        RoomAction::SetConnected {
            player_id: "bob".into(),
            connected: true,
        },
        T0,
    )
    .unwrap();
    assert!(same.events.is_empty());

    let off = step(
        &room,
        RoomAction::SetConnected {
            player_id: "bob".into(),
            connected: false,
        },
        T0,
    )
    .unwrap();
    assert!(matches!(
        off.events[0].event,
        RoomEvent::PlayerDisconnected { .. }
    ));
}

#[test]
fn grace_expiry_removes_only_disconnected_players() {
    let room = ok(&sudoku_room(4), join("bob"), T0);
    let noop = step(
        &room,
        RoomAction::ExpireGrace {
            player_id: "bob".into(),
        },
        T0,
    )
    .unwrap();
    assert!(noop.events.is_empty());
    assert_eq!(noop.room.players.len(), 2);

    let room = ok(
        &room,
        RoomAction::SetConnected {
            player_id: "bob".into(),
            connected: false,
        },
        T0,
    );
    let gone = step(
        &room,
        RoomAction::ExpireGrace {
            player_id: "bob".into(),
        },
        T0,
    )
    .unwrap();
    assert_eq!(gone.room.players.len(), 1);
    assert!(matches!(gone.events[0].event, RoomEvent::PlayerTimeout { .. }));
    assert!(matches!(gone.events[1].event, RoomEvent::PlayerLeft { .. }));
}
