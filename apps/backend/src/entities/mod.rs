pub mod player_progress;
pub mod player_sessions;
pub mod rooms;

pub use player_progress::Entity as PlayerProgressRows;
pub use player_sessions::Entity as PlayerSessions;
pub use rooms::Entity as Rooms;
