use time::macros::datetime;
use time::OffsetDateTime;

use super::room::{GameSettings, Room};
use super::rules::RoomRules;
use super::session::Identity;
use super::sudoku::fixtures::{GIVEN, SOLUTION};
use super::sudoku::{Difficulty, Puzzle};
use super::transitions::{apply, Applied, RoomAction};
use crate::errors::domain::DomainError;

pub const T0: OffsetDateTime = datetime!(2024-05-01 12:00 UTC);

pub fn ident(id: &str) -> Identity {
    Identity::new(id, id.to_uppercase())
}

pub fn rules() -> RoomRules {
    RoomRules::default()
}

pub fn puzzle() -> Puzzle {
    Puzzle {
        id: "fixture".into(),
        difficulty: Difficulty::Easy,
        given: GIVEN,
        solution: SOLUTION,
    }
}

pub fn sudoku_room(max_players: u8) -> Room {
    Room::create(
        &ident("alice"),
        GameSettings::Sudoku {
            difficulty: Difficulty::Easy,
            max_players,
        },
        "ABC234".into(),
        T0,
    )
}

pub fn caro_room() -> Room {
    Room::create(
        &ident("xavier"),
        GameSettings::Caro { vs_bot: false },
        "ABCD2345".into(),
        T0,
    )
}

pub fn step(room: &Room, action: RoomAction, at: OffsetDateTime) -> Result<Applied, DomainError> {
    apply(room, action, &rules(), at)
}

/// Apply and unwrap, returning the new room.
pub fn ok(room: &Room, action: RoomAction, at: OffsetDateTime) -> Room {
    match step(room, action, at) {
        Ok(applied) => applied.room,
        Err(e) => panic!("transition failed: {e}"),
    }
}

pub fn join(id: &str) -> RoomAction {
    RoomAction::Join {
        identity: ident(id),
    }
}

pub fn ready(id: &str) -> RoomAction {
    RoomAction::SetReady {
        player_id: id.into(),
        ready: true,
    }
}

/// Two-player Sudoku race, started at `T0`.
pub fn started_race() -> Room {
    let room = ok(&sudoku_room(4), join("bob"), T0);
    let room = ok(&room, ready("bob"), T0);
    ok(
        &room,
        RoomAction::Start {
            player_id: "alice".into(),
            puzzle: Some(puzzle()),
        },
        T0,
    )
}

/// Caro game between xavier (X) and olga (O), started at `T0`.
pub fn started_caro() -> Room {
    let room = ok(&caro_room(), join("olga"), T0);
    let room = ok(&room, ready("olga"), T0);
    ok(
        &room,
        RoomAction::Start {
            player_id: "xavier".into(),
            puzzle: None,
        },
        T0,
    )
}
