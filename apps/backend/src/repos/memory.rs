use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use time::OffsetDateTime;
use tracing::debug;

use super::{PurgeReport, RetentionPolicy, RoomStore};
use crate::domain::progress::PlayerProgress;
use crate::domain::room::Room;
use crate::domain::session::{PlayerSession, SessionKind};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};

/// In-process store for tests and single-node development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: DashMap<String, Room>,
    progress: DashMap<(String, String), PlayerProgress>,
    sessions: DashMap<String, PlayerSession>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn find_room(&self, code: &str) -> Result<Option<Room>, DomainError> {
        Ok(self.rooms.get(code).map(|r| r.clone()))
    }

    async fn insert_room(&self, room: &Room) -> Result<(), DomainError> {
        match self.rooms.entry(room.code.clone()) {
            Entry::Occupied(_) => Err(DomainError::conflict(
                ConflictKind::JoinCodeConflict,
                "Room code already exists",
            )),
            Entry::Vacant(slot) => {
                slot.insert(room.clone());
                Ok(())
            }
        }
    }

    async fn save_room(&self, room: &Room, expected_version: i64) -> Result<Room, DomainError> {
        let Some(mut stored) = self.rooms.get_mut(&room.code) else {
            return Err(DomainError::not_found(
                NotFoundKind::Room,
                format!("Room {} not found", room.code),
            ));
        };
        if stored.version != expected_version {
            return Err(DomainError::conflict(
                ConflictKind::OptimisticLock,
                format!(
                    "Room was modified concurrently (expected version {expected_version}, actual version {})",
                    stored.version
                ),
            ));
        }
        let mut saved = room.clone();
        saved.version = expected_version + 1;
        *stored = saved.clone();
        Ok(saved)
    }

    async fn delete_room(&self, code: &str) -> Result<(), DomainError> {
        self.rooms.remove(code);
        self.progress.retain(|(room_code, _), _| room_code != code);
        Ok(())
    }

    async fn find_progress(
        &self,
        code: &str,
        player_id: &str,
    ) -> Result<Option<PlayerProgress>, DomainError> {
        Ok(self
            .progress
            .get(&(code.to_string(), player_id.to_string()))
            .map(|p| p.clone()))
    }

    async fn save_progress(&self, progress: &PlayerProgress) -> Result<(), DomainError> {
        self.progress.insert(
            (progress.room_code.clone(), progress.player_id.clone()),
            progress.clone(),
        );
        Ok(())
    }

    async fn list_progress(&self, code: &str) -> Result<Vec<PlayerProgress>, DomainError> {
        let mut out: Vec<PlayerProgress> = self
            .progress
            .iter()
            .filter(|e| e.key().0 == code)
            .map(|e| e.value().clone())
            .collect();
        out.sort_by(|a, b| a.player_id.cmp(&b.player_id));
        Ok(out)
    }

    async fn find_session(&self, session_id: &str) -> Result<Option<PlayerSession>, DomainError> {
        Ok(self.sessions.get(session_id).map(|s| s.clone()))
    }

    async fn upsert_session(&self, session: &PlayerSession) -> Result<(), DomainError> {
        self.sessions
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn purge_expired(
        &self,
        now: OffsetDateTime,
        policy: &RetentionPolicy,
    ) -> Result<PurgeReport, DomainError> {
        let room_cutoff = policy.room_cutoff(now);
        let expired: Vec<String> = self
            .rooms
            .iter()
            .filter(|r| r.updated_at < room_cutoff)
            .map(|r| r.key().clone())
            .collect();
        for code in &expired {
            self.delete_room(code).await?;
        }

        let session_cutoff = policy.session_cutoff(now);
        let before = self.sessions.len();
        self.sessions
            .retain(|_, s| s.kind != SessionKind::Guest || s.last_seen_at >= session_cutoff);
        let sessions = (before - self.sessions.len()) as u64;

        debug!(rooms = expired.len(), sessions, "Purged expired documents");
        Ok(PurgeReport {
            rooms: expired.len() as u64,
            sessions,
        })
    }
}
