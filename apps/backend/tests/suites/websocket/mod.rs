mod error_handling_tests;
mod presence_tests;

use arena_backend::domain::room::GameSettings;
use arena_backend::domain::session::Identity;
use arena_backend::domain::sudoku::Difficulty;
use arena_backend::state::app_state::AppState;

/// Two-seat Sudoku room hosted by `host`. Returns its code.
pub async fn race_room(state: &AppState, host: &str) -> Result<String, Box<dyn std::error::Error>> {
    let room = state
        .rooms
        .create_room(
            &Identity::new(host, host),
            GameSettings::Sudoku { difficulty: Difficulty::Easy, max_players: 2 },
        )
        .await?;
    Ok(room.code)
}
