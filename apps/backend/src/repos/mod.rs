//! Durable room store contract.
//!
//! Two implementations: `MemoryStore` (in-process maps) and
//! `adapters::rooms_sea::SeaStore` (SeaORM over Postgres or SQLite).

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

pub use memory::MemoryStore;

use crate::domain::progress::PlayerProgress;
use crate::domain::room::Room;
use crate::domain::session::PlayerSession;
use crate::errors::domain::DomainError;

/// How long documents survive without activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Rooms (and their progress records) untouched for this long are purged
    pub room_ttl: Duration,
    /// Guest sessions not seen for this long are purged
    pub guest_session_ttl: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            room_ttl: Duration::from_secs(24 * 3600),
            guest_session_ttl: Duration::from_secs(30 * 24 * 3600),
        }
    }
}

impl RetentionPolicy {
    pub fn room_cutoff(&self, now: OffsetDateTime) -> OffsetDateTime {
        now - self.room_ttl
    }

    pub fn session_cutoff(&self, now: OffsetDateTime) -> OffsetDateTime {
        now - self.guest_session_ttl
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub rooms: u64,
    pub sessions: u64,
}

#[async_trait]
pub trait RoomStore: Send + Sync + 'static {
    async fn find_room(&self, code: &str) -> Result<Option<Room>, DomainError>;

    /// Insert a new room. An existing code fails with `JOIN_CODE_CONFLICT`.
    async fn insert_room(&self, room: &Room) -> Result<(), DomainError>;

    /// Save `room` if the stored version still equals `expected_version`.
    ///
    /// Returns the saved room with its bumped version. A version mismatch
    /// fails with `OPTIMISTIC_LOCK`, a missing room with `ROOM_NOT_FOUND`.
    async fn save_room(&self, room: &Room, expected_version: i64) -> Result<Room, DomainError>;

    /// Remove a room and its progress records. Missing rooms are ignored.
    async fn delete_room(&self, code: &str) -> Result<(), DomainError>;

    async fn find_progress(
        &self,
        code: &str,
        player_id: &str,
    ) -> Result<Option<PlayerProgress>, DomainError>;

    async fn save_progress(&self, progress: &PlayerProgress) -> Result<(), DomainError>;

    async fn list_progress(&self, code: &str) -> Result<Vec<PlayerProgress>, DomainError>;

    async fn find_session(&self, session_id: &str) -> Result<Option<PlayerSession>, DomainError>;

    async fn upsert_session(&self, session: &PlayerSession) -> Result<(), DomainError>;

    async fn purge_expired(
        &self,
        now: OffsetDateTime,
        policy: &RetentionPolicy,
    ) -> Result<PurgeReport, DomainError>;
}
