//! Room lifecycle: creation, and the load/apply/save cycle every mutation
//! goes through.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::identity::{results_for, IdentityProvider};
use super::puzzles::PuzzleProvider;
use crate::clock::Clock;
use crate::domain::progress::PlayerProgress;
use crate::domain::room::{GameSettings, Player, Room, RoomStatus};
use crate::domain::session::Identity;
use crate::domain::transitions::{apply, Applied, RoomAction};
use crate::domain::RoomRules;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::repos::RoomStore;
use crate::utils::join_code::generate_room_code;

/// Attempts at drawing an unused room code before giving up.
const CODE_ATTEMPTS: usize = 10;

pub struct RoomService {
    store: Arc<dyn RoomStore>,
    puzzles: Arc<dyn PuzzleProvider>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    rules: RoomRules,
}

impl RoomService {
    pub fn new(
        store: Arc<dyn RoomStore>,
        puzzles: Arc<dyn PuzzleProvider>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        rules: RoomRules,
    ) -> Self {
        Self {
            store,
            puzzles,
            identity,
            clock,
            rules,
        }
    }

    pub fn rules(&self) -> &RoomRules {
        &self.rules
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn store(&self) -> &Arc<dyn RoomStore> {
        &self.store
    }

    pub async fn create_room(
        &self,
        host: &Identity,
        settings: GameSettings,
    ) -> Result<Room, DomainError> {
        settings.validate()?;
        let now = self.clock.now();
        for attempt in 1..=CODE_ATTEMPTS {
            let code = generate_room_code(settings.kind());
            let room = Room::create(host, settings.clone(), code, now);
            match self.store.insert_room(&room).await {
                Ok(()) => {
                    info!(
                        room_code = %room.code,
                        player_id = %host.player_id,
                        kind = room.kind().as_str(),
                        "Room created"
                    );
                    return Ok(room);
                }
                Err(DomainError::Conflict(ConflictKind::JoinCodeConflict, _)) => {
                    debug!(attempt, "Room code collision, drawing another");
                }
                Err(e) => return Err(e),
            }
        }
        Err(DomainError::conflict(
            ConflictKind::JoinCodeConflict,
            "Could not allocate a unique room code",
        ))
    }

    pub async fn load(&self, code: &str) -> Result<Room, DomainError> {
        self.store.find_room(code).await?.ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Room, format!("Room {code} not found"))
        })
    }

    /// Load, transition and save. A version conflict is retried once
    /// against a fresh load.
    pub async fn execute(&self, code: &str, action: RoomAction) -> Result<Applied, DomainError> {
        let action = self.prepare(code, action).await?;
        let mut retried = false;
        loop {
            let before = self.load(code).await?;
            let applied = apply(&before, action.clone(), &self.rules, self.clock.now())?;
            match self.persist(&before, applied).await {
                Err(e) if e.is_optimistic_lock() && !retried => {
                    warn!(room_code = %code, action = action.name(), "Version conflict, retrying");
                    retried = true;
                }
                other => return other,
            }
        }
    }

    /// Attach a fresh puzzle to Sudoku starts.
    async fn prepare(&self, code: &str, action: RoomAction) -> Result<RoomAction, DomainError> {
        let player_id = match action {
            RoomAction::Start {
                player_id,
                puzzle: None,
            } => player_id,
            other => return Ok(other),
        };
        let room = self.load(code).await?;
        let puzzle = match (&room.settings, &room.status) {
            (GameSettings::Sudoku { difficulty, .. }, RoomStatus::Waiting)
                if room.is_host(&player_id) && room.can_start() =>
            {
                Some(self.puzzles.generate(*difficulty).await?)
            }
            _ => None,
        };
        Ok(RoomAction::Start { player_id, puzzle })
    }

    async fn persist(&self, before: &Room, mut applied: Applied) -> Result<Applied, DomainError> {
        if applied.deleted {
            self.store.delete_room(&before.code).await?;
            info!(room_code = %before.code, "Room removed");
            return Ok(applied);
        }
        if !applied.changed(before) {
            return Ok(applied);
        }

        applied.room = self.store.save_room(&applied.room, before.version).await?;
        // The room is committed from here on; progress rows are derived from it.
        self.sync_progress(before, &applied.room).await;

        if !before.is_finished() && applied.room.is_finished() {
            self.record_results(&applied.room).await;
        }
        Ok(applied)
    }

    /// Mirror changed race seats into progress records.
    async fn sync_progress(&self, before: &Room, after: &Room) {
        if after.started_at().is_none() {
            return;
        }
        let now = self.clock.now();
        for player in &after.players {
            let unchanged = before.player(&player.id).and_then(Player::race) == player.race();
            if unchanged {
                continue;
            }
            let Some(progress) = PlayerProgress::from_seat(after, player, now) else {
                continue;
            };
            if let Err(e) = self.store.save_progress(&progress).await {
                warn!(room_code = %after.code, player_id = %player.id, error = %e, "Failed to mirror race progress");
            }
        }
    }

    async fn record_results(&self, room: &Room) {
        for (player_id, result) in results_for(room) {
            if let Err(e) = self.identity.record_result(&player_id, result).await {
                warn!(room_code = %room.code, player_id = %player_id, error = %e, "Failed to record result");
            }
        }
    }
}
