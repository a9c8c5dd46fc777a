use std::sync::Arc;

use tracing::info;

use crate::adapters::SeaStore;
use crate::ai::{CaroAi, MinimaxBot};
use crate::clock::{Clock, SystemClock};
use crate::config::{ArenaConfig, StoreKind};
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::repos::{MemoryStore, RoomStore};
use crate::services::{
    GeneratedPuzzles, IdentityProvider, PuzzleProvider, RoomService, StoreIdentity,
};
use crate::state::app_state::AppState;
use crate::supervisor::{RoomHub, WorkerContext};
use crate::ws::WsRegistry;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    config: ArenaConfig,
    store: Option<Arc<dyn RoomStore>>,
    puzzles: Option<Arc<dyn PuzzleProvider>>,
    clock: Option<Arc<dyn Clock>>,
    bot: Option<Arc<dyn CaroAi>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            config: ArenaConfig::default(),
            store: None,
            puzzles: None,
            clock: None,
            bot: None,
        }
    }

    pub fn with_config(mut self, config: ArenaConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this store instead of the one `config.store` selects.
    pub fn with_store(mut self, store: Arc<dyn RoomStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_puzzles(mut self, puzzles: Arc<dyn PuzzleProvider>) -> Self {
        self.puzzles = Some(puzzles);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_bot(mut self, bot: Arc<dyn CaroAi>) -> Self {
        self.bot = Some(bot);
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let config = self.config;
        let store = match self.store {
            Some(store) => store,
            None => open_store(&config).await?,
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let puzzles = self
            .puzzles
            .unwrap_or_else(|| Arc::new(GeneratedPuzzles::new()));
        let bot = self.bot.unwrap_or_else(|| Arc::new(MinimaxBot::default()));

        let identity: Arc<dyn IdentityProvider> =
            Arc::new(StoreIdentity::new(store.clone(), clock.clone()));
        let rooms = Arc::new(RoomService::new(
            store.clone(),
            puzzles,
            identity.clone(),
            clock.clone(),
            config.rules,
        ));
        let registry = Arc::new(WsRegistry::new());
        let hub = Arc::new(RoomHub::new(WorkerContext {
            rooms: rooms.clone(),
            sink: registry.clone(),
            bot,
            idle: config.worker_idle,
        }));

        Ok(AppState::new(
            config, store, rooms, hub, identity, clock, registry,
        ))
    }
}

async fn open_store(config: &ArenaConfig) -> Result<Arc<dyn RoomStore>, AppError> {
    match (config.store, config.database_url.as_deref()) {
        (StoreKind::Memory, _) => {
            info!(store = %config.store, "Using in-memory room store");
            Ok(Arc::new(MemoryStore::new()))
        }
        (kind, Some(url)) => {
            info!(store = %kind, "Using SQL room store");
            Ok(Arc::new(SeaStore::new(bootstrap_db(url).await?)))
        }
        (kind, None) => Err(AppError::config(format!(
            "No database URL configured for the {kind} store"
        ))),
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
