//! Domain layer: pure room and game logic. No I/O, no clocks.

pub mod caro;
pub mod events;
pub mod progress;
pub mod room;
pub mod rules;
pub mod session;
pub mod sudoku;
pub mod transitions;

#[cfg(test)]
pub(crate) mod test_helpers;
#[cfg(test)]
mod tests_caro_flow;
#[cfg(test)]
mod tests_lobby;
#[cfg(test)]
mod tests_props_rules;

// Re-exports for ergonomics
pub use caro::{Board, Symbol};
pub use events::{Audience, Outbound, RoomEvent, RoomSnapshot};
pub use progress::PlayerProgress;
pub use room::{GameKind, GameSettings, Room, RoomStatus};
pub use rules::RoomRules;
pub use session::{Identity, PlayerId, PlayerSession};
pub use sudoku::{Difficulty, Grid, Puzzle};
pub use transitions::{apply, Applied, Move, RoomAction};
