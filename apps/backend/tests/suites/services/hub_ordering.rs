use std::sync::Arc;

use arena_backend::domain::room::GameSettings;
use arena_backend::domain::session::Identity;
use arena_backend::domain::sudoku::Difficulty;
use arena_backend::domain::transitions::{Move, RoomAction};
use arena_backend::ErrorCode;
use futures_util::future::join_all;

use super::harness;
use crate::support::fixtures::GIVEN;

#[tokio::test]
async fn test_concurrent_joins_never_overfill() -> Result<(), Box<dyn std::error::Error>> {
    let h = Arc::new(harness());
    let room = h
        .rooms
        .create_room(
            &Identity::new("host", "Host"),
            GameSettings::Sudoku { difficulty: Difficulty::Easy, max_players: 4 },
        )
        .await?;

    let joins = (0..10).map(|i| {
        let h = h.clone();
        let code = room.code.clone();
        async move {
            h.hub
                .act(
                    &code,
                    RoomAction::Join { identity: Identity::new(format!("p{i}"), format!("P{i}")) },
                )
                .await
        }
    });
    let results = join_all(joins).await;

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 3);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.code() == ErrorCode::RoomFull));

    let stored = h.rooms.load(&room.code).await?;
    assert_eq!(stored.players.len(), 4);
    assert_eq!(stored.version, 3);
    assert_eq!(h.hub.active_workers(), 1);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_moves_are_all_applied() -> Result<(), Box<dyn std::error::Error>> {
    let h = Arc::new(harness());
    let room = h
        .rooms
        .create_room(
            &Identity::new("host", "Host"),
            GameSettings::Sudoku { difficulty: Difficulty::Easy, max_players: 2 },
        )
        .await?;
    let code = room.code.clone();
    h.hub
        .act(&code, RoomAction::Join { identity: Identity::new("g", "G") })
        .await?;
    h.hub
        .act(&code, RoomAction::SetReady { player_id: "g".into(), ready: true })
        .await?;
    h.hub
        .act(&code, RoomAction::Start { player_id: "host".into(), puzzle: None })
        .await?;
    let before = h.rooms.load(&code).await?.version;

    let open: Vec<(i32, i32)> = (0..9)
        .flat_map(|r| (0..9).map(move |c| (r, c)))
        .filter(|&(r, c)| GIVEN[r as usize][c as usize] == 0)
        .take(12)
        .collect();
    let moves = open.iter().map(|&(row, col)| {
        let h = h.clone();
        let code = code.clone();
        async move {
            h.hub
                .act(
                    &code,
                    RoomAction::Move {
                        player_id: "g".into(),
                        mv: Move::ToggleNote { row, col, value: 1 },
                    },
                )
                .await
        }
    });
    for result in join_all(moves).await {
        result?;
    }

    let stored = h.rooms.load(&code).await?;
    assert_eq!(stored.version, before + open.len() as i64);
    let race = stored.player("g").and_then(|p| p.race()).ok_or("no race seat")?;
    for (row, col) in open {
        assert_eq!(race.notes[row as usize][col as usize], 1 << 1);
    }
    Ok(())
}
