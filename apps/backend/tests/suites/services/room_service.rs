use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arena_backend::config::RoomRules;
use arena_backend::domain::progress::{PlayerProgress, ProgressStatus};
use arena_backend::domain::room::{GameSettings, Room};
use arena_backend::domain::session::{Identity, PlayerSession};
use arena_backend::domain::sudoku::Difficulty;
use arena_backend::domain::transitions::{Move, RoomAction};
use arena_backend::errors::domain::{ConflictKind, DomainError, InfraErrorKind};
use arena_backend::repos::{MemoryStore, PurgeReport, RetentionPolicy, RoomStore};
use arena_backend::ErrorCode;
use async_trait::async_trait;
use time::OffsetDateTime;

use super::{harness, harness_with};
use crate::support::fixtures::SOLUTION;

fn race_settings() -> GameSettings {
    GameSettings::Sudoku {
        difficulty: Difficulty::Easy,
        max_players: 2,
    }
}

#[tokio::test]
async fn test_create_room_persists_waiting_room() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness();
    let host = Identity::new("host-1", "Host");

    let room = h.rooms.create_room(&host, race_settings()).await?;
    assert_eq!(room.code.len(), 6);
    assert!(room
        .code
        .bytes()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));

    let stored = h.rooms.load(&room.code).await?;
    assert_eq!(stored, room);
    assert_eq!(stored.version, 0);

    let caro = h
        .rooms
        .create_room(&host, GameSettings::Caro { vs_bot: true })
        .await?;
    assert_eq!(caro.code.len(), 8);
    assert_eq!(caro.players.len(), 2);
    assert!(caro.players[1].is_bot);
    Ok(())
}

#[tokio::test]
async fn test_create_room_rejects_bad_player_count() {
    let h = harness();
    let err = h
        .rooms
        .create_room(
            &Identity::new("h", "H"),
            GameSettings::Sudoku {
                difficulty: Difficulty::Hard,
                max_players: 1,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_execute_bumps_version_and_skips_noop_saves() -> Result<(), Box<dyn std::error::Error>>
{
    let h = harness();
    let room = h
        .rooms
        .create_room(&Identity::new("h", "H"), race_settings())
        .await?;
    let guest = Identity::new("g", "G");

    let applied = h
        .rooms
        .execute(&room.code, RoomAction::Join { identity: guest.clone() })
        .await?;
    assert_eq!(applied.room.version, 1);

    // Already connected member joining again changes nothing
    let applied = h
        .rooms
        .execute(&room.code, RoomAction::Join { identity: guest })
        .await?;
    assert!(applied.events.is_empty());
    assert_eq!(h.rooms.load(&room.code).await?.version, 1);
    Ok(())
}

#[tokio::test]
async fn test_race_progress_is_mirrored_to_store() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness();
    let room = h
        .rooms
        .create_room(&Identity::new("h", "H"), race_settings())
        .await?;
    let code = room.code.clone();
    h.rooms
        .execute(&code, RoomAction::Join { identity: Identity::new("g", "G") })
        .await?;
    h.rooms
        .execute(&code, RoomAction::SetReady { player_id: "g".into(), ready: true })
        .await?;
    h.rooms
        .execute(&code, RoomAction::Start { player_id: "h".into(), puzzle: None })
        .await?;

    h.rooms
        .execute(
            &code,
            RoomAction::Move {
                player_id: "g".into(),
                mv: Move::SetValue { row: 0, col: 2, value: 9 },
            },
        )
        .await?;
    let progress = h.store.find_progress(&code, "g").await?.ok_or("no progress")?;
    assert_eq!(progress.mistakes, 1);
    assert_eq!(progress.grid[0][2], 9);
    assert_eq!(progress.status, ProgressStatus::Playing);

    h.rooms
        .execute(&code, RoomAction::Complete { player_id: "g".into(), grid: SOLUTION })
        .await?;
    let progress = h.store.find_progress(&code, "g").await?.ok_or("no progress")?;
    assert_eq!(progress.status, ProgressStatus::Completed);
    assert!(progress.completed_at.is_some());
    assert!(progress.elapsed_ms.is_some());

    let all: Vec<PlayerProgress> = h.store.list_progress(&code).await?;
    assert_eq!(all.len(), 2);
    Ok(())
}

/// Memory store whose next `failures` saves report a concurrent write.
/// With `progress_down` every progress write fails.
struct ContendedStore {
    inner: MemoryStore,
    failures: AtomicUsize,
    progress_down: bool,
}

impl ContendedStore {
    fn failing(failures: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            failures: AtomicUsize::new(failures),
            progress_down: false,
        }
    }

    fn without_progress() -> Self {
        Self {
            progress_down: true,
            ..Self::failing(0)
        }
    }
}

#[async_trait]
impl RoomStore for ContendedStore {
    async fn find_room(&self, code: &str) -> Result<Option<Room>, DomainError> {
        self.inner.find_room(code).await
    }

    async fn insert_room(&self, room: &Room) -> Result<(), DomainError> {
        self.inner.insert_room(room).await
    }

    async fn save_room(&self, room: &Room, expected_version: i64) -> Result<Room, DomainError> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(DomainError::conflict(
                ConflictKind::OptimisticLock,
                "Room was modified concurrently",
            ));
        }
        self.inner.save_room(room, expected_version).await
    }

    async fn delete_room(&self, code: &str) -> Result<(), DomainError> {
        self.inner.delete_room(code).await
    }

    async fn find_progress(
        &self,
        code: &str,
        player_id: &str,
    ) -> Result<Option<PlayerProgress>, DomainError> {
        self.inner.find_progress(code, player_id).await
    }

    async fn save_progress(&self, progress: &PlayerProgress) -> Result<(), DomainError> {
        if self.progress_down {
            return Err(DomainError::infra(
                InfraErrorKind::DbUnavailable,
                "progress table unavailable",
            ));
        }
        self.inner.save_progress(progress).await
    }

    async fn list_progress(&self, code: &str) -> Result<Vec<PlayerProgress>, DomainError> {
        self.inner.list_progress(code).await
    }

    async fn find_session(&self, session_id: &str) -> Result<Option<PlayerSession>, DomainError> {
        self.inner.find_session(session_id).await
    }

    async fn upsert_session(&self, session: &PlayerSession) -> Result<(), DomainError> {
        self.inner.upsert_session(session).await
    }

    async fn purge_expired(
        &self,
        now: OffsetDateTime,
        policy: &RetentionPolicy,
    ) -> Result<PurgeReport, DomainError> {
        self.inner.purge_expired(now, policy).await
    }
}

#[tokio::test]
async fn test_version_conflict_is_retried_once() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness_with(Arc::new(ContendedStore::failing(1)), RoomRules::default());
    let room = h
        .rooms
        .create_room(&Identity::new("h", "H"), race_settings())
        .await?;

    let applied = h
        .rooms
        .execute(&room.code, RoomAction::Join { identity: Identity::new("g", "G") })
        .await?;
    assert_eq!(applied.room.players.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_second_version_conflict_surfaces() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness_with(Arc::new(ContendedStore::failing(2)), RoomRules::default());
    let room = h
        .rooms
        .create_room(&Identity::new("h", "H"), race_settings())
        .await?;

    let err = h
        .rooms
        .execute(&room.code, RoomAction::Join { identity: Identity::new("g", "G") })
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OptimisticLock);
    assert_eq!(h.rooms.load(&room.code).await?.players.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_finished_games_update_player_stats() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness();
    let host = Identity::new("h", "H");
    let guest = Identity::new("g", "G");
    let now = OffsetDateTime::now_utc();
    h.store
        .upsert_session(&PlayerSession::new_guest(&host, now))
        .await?;
    h.store
        .upsert_session(&PlayerSession::new_guest(&guest, now))
        .await?;

    let room = h
        .rooms
        .create_room(&host, GameSettings::Caro { vs_bot: false })
        .await?;
    let code = room.code.clone();
    h.rooms
        .execute(&code, RoomAction::Join { identity: guest })
        .await?;
    h.rooms
        .execute(&code, RoomAction::SetReady { player_id: "g".into(), ready: true })
        .await?;
    h.rooms
        .execute(&code, RoomAction::Start { player_id: "h".into(), puzzle: None })
        .await?;
    h.rooms
        .execute(&code, RoomAction::GiveUp { player_id: "g".into() })
        .await?;

    let host_stats = h.store.find_session("h").await?.ok_or("no host")?.stats;
    let guest_stats = h.store.find_session("g").await?.ok_or("no guest")?.stats;
    assert_eq!(host_stats.wins, 1);
    assert_eq!(guest_stats.losses, 1);
    assert!(host_stats.points > guest_stats.points);
    Ok(())
}

#[tokio::test]
async fn test_progress_write_failure_keeps_committed_move() -> Result<(), Box<dyn std::error::Error>>
{
    let h = harness_with(Arc::new(ContendedStore::without_progress()), RoomRules::default());
    let room = h
        .rooms
        .create_room(&Identity::new("h", "H"), race_settings())
        .await?;
    let code = room.code.clone();
    h.hub
        .act(&code, RoomAction::Join { identity: Identity::new("g", "G") })
        .await?;
    h.hub
        .act(&code, RoomAction::SetReady { player_id: "g".into(), ready: true })
        .await?;
    h.hub
        .act(&code, RoomAction::Start { player_id: "h".into(), puzzle: None })
        .await?;
    let version = h.rooms.load(&code).await?.version;

    let outcome = h
        .hub
        .act(
            &code,
            RoomAction::Move {
                player_id: "g".into(),
                mv: Move::SetValue { row: 0, col: 2, value: 9 },
            },
        )
        .await?;
    assert!(outcome.room.is_some());
    assert_eq!(h.rooms.load(&code).await?.version, version + 1);
    assert!(h.store.find_progress(&code, "g").await?.is_none());
    assert!(h
        .sink
        .names(&code)
        .contains(&"sudoku:progress_update".to_string()));
    Ok(())
}
