use time::Duration;

use super::caro::Symbol;
use super::events::RoomEvent;
use super::room::{EndReason, RoomStatus};
use super::test_helpers::{ok, rules, started_caro, step, T0};
use super::transitions::{turn_deadline, Move, RoomAction};
use crate::errors::ErrorCode;

fn place(player: &str, row: i32, col: i32) -> RoomAction {
    RoomAction::Move {
        player_id: player.into(),
        mv: Move::Place { row, col },
    }
}

fn pause(player: &str) -> RoomAction {
    RoomAction::Pause {
        player_id: player.into(),
    }
}

fn resume(player: &str) -> RoomAction {
    RoomAction::Resume {
        player_id: player.into(),
    }
}

fn finished(room: &super::room::Room) -> &super::room::FinishedGame {
    match &room.status {
        RoomStatus::Finished(f) => f,
        other => panic!("expected finished room, got {other:?}"),
    }
}

#[test]
fn x_moves_first_and_turn_alternates() {
    let room = started_caro();
    assert_eq!(room.caro().unwrap().turn, Symbol::X);
    assert_eq!(
        step(&room, place("olga", 7, 7), T0).unwrap_err().code(),
        ErrorCode::NotYourTurn
    );

    let t1 = T0 + Duration::seconds(4);
    let room = ok(&room, place("xavier", 7, 7), t1);
    let game = room.caro().unwrap();
    assert_eq!(game.turn, Symbol::O);
    assert_eq!(game.turn_started_at, t1);
    assert_eq!(game.move_count, 1);
    assert_eq!(
        step(&room, place("xavier", 7, 8), t1).unwrap_err().code(),
        ErrorCode::NotYourTurn
    );
}

#[test]
fn occupied_and_out_of_range_cells_are_invalid() {
    let room = ok(&started_caro(), place("xavier", 7, 7), T0);
    assert_eq!(
        step(&room, place("olga", 7, 7), T0).unwrap_err().code(),
        ErrorCode::InvalidMove
    );
    assert_eq!(
        step(&room, place("olga", 15, 0), T0).unwrap_err().code(),
        ErrorCode::InvalidMove
    );
}

#[test]
fn sudoku_moves_are_wrong_game_kind() {
    let err = step(
        &started_caro(),
        RoomAction::Move {
            player_id: "xavier".into(),
            mv: Move::SetValue {
                row: 0,
                col: 0,
                value: 1,
            },
        },
        T0,
    )
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::WrongGameKind);
}

#[test]
fn five_in_row_wins_for_mover() {
    let mut room = started_caro();
    for i in 0..4 {
        room = ok(&room, place("xavier", 7, i), T0);
        room = ok(&room, place("olga", 9, i), T0);
    }
    let applied = step(&room, place("xavier", 7, 4), T0).unwrap();
    let f = finished(&applied.room);
    assert_eq!(f.winner_id.as_deref(), Some("xavier"));
    assert_eq!(f.reason, EndReason::FiveInRow);
    assert!(f.game.is_some());
    assert!(matches!(
        applied.events[0].event,
        RoomEvent::MoveMade { next_turn: None, .. }
    ));
    assert!(matches!(applied.events[1].event, RoomEvent::GameEnded { .. }));
    assert_eq!(
        step(&applied.room, place("olga", 0, 0), T0).unwrap_err().code(),
        ErrorCode::AlreadyFinished
    );
}

#[test]
fn pause_at_100s_resumes_with_exactly_200s_left() {
    let room = started_caro();
    let paused_at = T0 + Duration::seconds(100);
    let applied = step(&room, pause("olga"), paused_at).unwrap();
    assert!(matches!(
        applied.events[0].event,
        RoomEvent::GamePaused {
            remaining_ms: 200_000,
            ..
        }
    ));
    let room = applied.room;
    assert_eq!(turn_deadline(room.caro().unwrap(), &rules()), None);

    let resumed_at = T0 + Duration::seconds(500);
    let room = ok(&room, resume("olga"), resumed_at);
    let deadline = turn_deadline(room.caro().unwrap(), &rules()).unwrap();
    assert_eq!(deadline - resumed_at, Duration::seconds(200));
}

#[test]
fn pause_rules() {
    let room = ok(&started_caro(), pause("xavier"), T0);
    assert_eq!(
        step(&room, pause("olga"), T0).unwrap_err().code(),
        ErrorCode::AlreadyPaused
    );
    assert_eq!(
        step(&room, resume("olga"), T0).unwrap_err().code(),
        ErrorCode::NotPausedByYou
    );
    assert_eq!(
        step(&room, place("xavier", 0, 0), T0).unwrap_err().code(),
        ErrorCode::GamePaused
    );
    let room = ok(&room, resume("xavier"), T0);
    assert_eq!(
        step(&room, resume("xavier"), T0).unwrap_err().code(),
        ErrorCode::NotPaused
    );
}

#[test]
fn expire_turn_before_deadline_is_noop() {
    let room = started_caro();
    let applied = step(&room, RoomAction::ExpireTurn, T0 + Duration::seconds(299)).unwrap();
    assert!(applied.events.is_empty());
    assert!(!applied.changed(&room));
}

#[test]
fn turn_timeout_gives_win_to_opponent_of_current_turn() {
    let room = started_caro();
    let applied = step(&room, RoomAction::ExpireTurn, T0 + Duration::seconds(300)).unwrap();
    let f = finished(&applied.room);
    assert_eq!(f.winner_id.as_deref(), Some("olga"));
    assert_eq!(f.reason, EndReason::Timeout);
    assert!(matches!(
        applied.events[0].event,
        RoomEvent::PlayerTimeout { ref player_id, .. } if player_id == "xavier"
    ));
    assert!(applied.room.caro().is_none());
}

#[test]
fn paused_turn_never_expires() {
    let room = ok(&started_caro(), pause("xavier"), T0);
    let applied = step(&room, RoomAction::ExpireTurn, T0 + Duration::hours(1)).unwrap();
    assert!(applied.events.is_empty());
}

#[test]
fn move_after_turn_timeout_is_turn_timeout_exceeded() {
    let room = started_caro();
    let late = T0 + Duration::seconds(301);
    let timed_out = ok(&room, RoomAction::ExpireTurn, late);
    assert_eq!(
        step(&timed_out, place("xavier", 0, 0), late).unwrap_err().code(),
        ErrorCode::TurnTimeoutExceeded
    );
}

#[test]
fn give_up_hands_win_to_opponent() {
    let room = ok(
        &started_caro(),
        RoomAction::GiveUp {
            player_id: "olga".into(),
        },
        T0,
    );
    let f = finished(&room);
    assert_eq!(f.winner_id.as_deref(), Some("xavier"));
    assert_eq!(f.reason, EndReason::GaveUp);
}

#[test]
fn leaving_running_game_forfeits() {
    let applied = step(
        &started_caro(),
        RoomAction::Leave {
            player_id: "xavier".into(),
        },
        T0,
    )
    .unwrap();
    let f = finished(&applied.room);
    assert_eq!(f.winner_id.as_deref(), Some("olga"));
    assert_eq!(f.reason, EndReason::OpponentLeft);
    assert_eq!(applied.room.host_id, "olga");
    assert!(!applied.deleted);
}
