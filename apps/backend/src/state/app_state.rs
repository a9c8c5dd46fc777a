use std::sync::Arc;

use crate::clock::Clock;
use crate::config::ArenaConfig;
use crate::repos::RoomStore;
use crate::services::{IdentityProvider, RoomService};
use crate::supervisor::RoomHub;
use crate::ws::WsRegistry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArenaConfig>,
    pub store: Arc<dyn RoomStore>,
    pub rooms: Arc<RoomService>,
    /// Single write path for every room
    pub hub: Arc<RoomHub>,
    pub identity: Arc<dyn IdentityProvider>,
    pub clock: Arc<dyn Clock>,
    registry: Arc<WsRegistry>,
}

impl AppState {
    pub fn new(
        config: ArenaConfig,
        store: Arc<dyn RoomStore>,
        rooms: Arc<RoomService>,
        hub: Arc<RoomHub>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        registry: Arc<WsRegistry>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            rooms,
            hub,
            identity,
            clock,
            registry,
        }
    }

    pub fn websocket_registry(&self) -> Arc<WsRegistry> {
        self.registry.clone()
    }
}
