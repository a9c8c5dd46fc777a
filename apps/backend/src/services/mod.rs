//! Services: orchestration between the room state machine, the store and
//! the identity and puzzle collaborators.

pub mod identity;
pub mod puzzles;
pub mod rooms;

pub use identity::{IdentityProvider, StoreIdentity};
pub use puzzles::{FixedPuzzle, GeneratedPuzzles, PuzzleProvider};
pub use rooms::RoomService;
