use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::room::{Player, Room};
use super::session::PlayerId;
use super::sudoku::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Playing,
    Completed,
    GaveUp,
}

impl ProgressStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStatus::Playing => "playing",
            ProgressStatus::Completed => "completed",
            ProgressStatus::GaveUp => "gave_up",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "playing" => Some(ProgressStatus::Playing),
            "completed" => Some(ProgressStatus::Completed),
            "gave_up" => Some(ProgressStatus::GaveUp),
            _ => None,
        }
    }
}

/// Durable per-(room, player) record of a Sudoku race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProgress {
    pub room_code: String,
    pub player_id: PlayerId,
    pub grid: Grid,
    pub mistakes: u32,
    pub status: ProgressStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub elapsed_ms: Option<u64>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl PlayerProgress {
    /// Project a racer's seat into its durable record. `None` for Caro seats.
    pub fn from_seat(room: &Room, player: &Player, now: OffsetDateTime) -> Option<Self> {
        let race = player.race()?;
        let status = if race.finished_at.is_some() {
            ProgressStatus::Completed
        } else if race.gave_up {
            ProgressStatus::GaveUp
        } else {
            ProgressStatus::Playing
        };
        let elapsed_ms = match (race.finished_at, room.started_at()) {
            (Some(done), Some(start)) => Some(elapsed_ms(start, done)),
            _ => None,
        };
        Some(Self {
            room_code: room.code.clone(),
            player_id: player.id.clone(),
            grid: race.grid,
            mistakes: race.errors,
            status,
            completed_at: race.finished_at,
            elapsed_ms,
            updated_at: now,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status != ProgressStatus::Playing
    }
}

/// Milliseconds between two instants, floored at zero.
pub fn elapsed_ms(from: OffsetDateTime, to: OffsetDateTime) -> u64 {
    let ms = (to - from).whole_milliseconds();
    u64::try_from(ms.max(0)).unwrap_or(u64::MAX)
}
