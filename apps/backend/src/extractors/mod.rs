pub mod current_player;
pub mod room_code;
pub mod validated_json;

pub use current_player::CurrentPlayer;
pub use room_code::RoomCode;
pub use validated_json::ValidatedJson;
