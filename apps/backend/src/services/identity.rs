//! Player identity: guest sessions and win/loss bookkeeping.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::room::{EndReason, Room, RoomStatus};
use crate::domain::session::{GameResult, Identity, PlayerId, PlayerSession};
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::repos::RoomStore;

pub const MAX_DISPLAY_NAME_LEN: usize = 32;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the caller, creating a guest session on first contact.
    async fn resolve(&self, session_id: &str, display_name: &str) -> Result<Identity, DomainError>;

    /// Start a fresh guest session with a generated id.
    async fn create_guest(&self, display_name: &str) -> Result<PlayerSession, DomainError>;

    async fn session(&self, session_id: &str) -> Result<PlayerSession, DomainError>;

    /// Add a finished game to the player's stats. Unknown players are ignored.
    async fn record_result(&self, player_id: &str, result: GameResult) -> Result<(), DomainError>;
}

/// Sessions kept in the room store.
pub struct StoreIdentity {
    store: Arc<dyn RoomStore>,
    clock: Arc<dyn Clock>,
}

impl StoreIdentity {
    pub fn new(store: Arc<dyn RoomStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

pub fn normalize_display_name(raw: &str) -> Result<String, DomainError> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(DomainError::validation(
            ValidationKind::Other("InvalidDisplayName".into()),
            format!("Display name must be 1 to {MAX_DISPLAY_NAME_LEN} characters"),
        ));
    }
    Ok(name.to_string())
}

#[async_trait]
impl IdentityProvider for StoreIdentity {
    async fn resolve(&self, session_id: &str, display_name: &str) -> Result<Identity, DomainError> {
        let name = normalize_display_name(display_name)?;
        let now = self.clock.now();
        let session = match self.store.find_session(session_id).await? {
            Some(mut existing) => {
                existing.display_name = name;
                existing.last_seen_at = now;
                existing
            }
            None => {
                debug!(player_id = %session_id, "Creating guest session on first contact");
                PlayerSession::new_guest(&Identity::new(session_id, name), now)
            }
        };
        self.store.upsert_session(&session).await?;
        Ok(session.identity())
    }

    async fn create_guest(&self, display_name: &str) -> Result<PlayerSession, DomainError> {
        let name = normalize_display_name(display_name)?;
        let identity = Identity::new(Uuid::new_v4().to_string(), name);
        let session = PlayerSession::new_guest(&identity, self.clock.now());
        self.store.upsert_session(&session).await?;
        info!(player_id = %session.session_id, "Guest session created");
        Ok(session)
    }

    async fn session(&self, session_id: &str) -> Result<PlayerSession, DomainError> {
        self.store.find_session(session_id).await?.ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Session, format!("Session {session_id} not found"))
        })
    }

    async fn record_result(&self, player_id: &str, result: GameResult) -> Result<(), DomainError> {
        let Some(mut session) = self.store.find_session(player_id).await? else {
            return Ok(());
        };
        session.record(result);
        self.store.upsert_session(&session).await
    }
}

/// Per-player results of a finished room. Bots are skipped.
pub fn results_for(room: &Room) -> Vec<(PlayerId, GameResult)> {
    let RoomStatus::Finished(finished) = &room.status else {
        return Vec::new();
    };
    let mut results: Vec<(PlayerId, GameResult)> = room
        .players
        .iter()
        .filter(|p| !p.is_bot)
        .map(|p| {
            let result = match (&finished.winner_id, finished.reason) {
                (Some(winner), _) if *winner == p.id => GameResult::Win,
                (None, EndReason::Draw) => GameResult::Draw,
                _ => GameResult::Loss,
            };
            (p.id.clone(), result)
        })
        .collect();
    // A race winner may have left after completing.
    if let Some(winner) = &finished.winner_id {
        if !room.is_member(winner) {
            results.push((winner.clone(), GameResult::Win));
        }
    }
    results
}
