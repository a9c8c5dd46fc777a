//! Room document: settings, roster and the tagged lifecycle status.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::caro::{Board, Symbol};
use super::session::{Identity, PlayerId};
use super::sudoku::{Difficulty, Grid, Notes, EMPTY_GRID, EMPTY_NOTES};
use crate::errors::domain::{DomainError, ValidationKind};

pub const MIN_SUDOKU_PLAYERS: u8 = 2;
pub const MAX_SUDOKU_PLAYERS: u8 = 4;
pub const CARO_PLAYERS: usize = 2;
pub const BOT_PLAYER_ID: &str = "caro-bot";
pub const BOT_DISPLAY_NAME: &str = "Bot";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Sudoku,
    Caro,
}

impl GameKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GameKind::Sudoku => "sudoku",
            GameKind::Caro => "caro",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GameSettings {
    Sudoku {
        #[serde(default)]
        difficulty: Difficulty,
        #[serde(default = "default_max_players")]
        max_players: u8,
    },
    Caro {
        #[serde(default)]
        vs_bot: bool,
    },
}

fn default_max_players() -> u8 {
    MAX_SUDOKU_PLAYERS
}

impl GameSettings {
    pub fn kind(&self) -> GameKind {
        match self {
            GameSettings::Sudoku { .. } => GameKind::Sudoku,
            GameSettings::Caro { .. } => GameKind::Caro,
        }
    }

    pub fn max_players(&self) -> usize {
        match self {
            GameSettings::Sudoku { max_players, .. } => *max_players as usize,
            GameSettings::Caro { .. } => CARO_PLAYERS,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if let GameSettings::Sudoku { max_players, .. } = self {
            if !(MIN_SUDOKU_PLAYERS..=MAX_SUDOKU_PLAYERS).contains(max_players) {
                return Err(DomainError::validation(
                    ValidationKind::InvalidSettings,
                    format!(
                        "max_players must be between {MIN_SUDOKU_PLAYERS} and {MAX_SUDOKU_PLAYERS}"
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Per-player Sudoku race state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceSeat {
    pub progress: u8,
    pub errors: u32,
    pub grid: Grid,
    pub notes: Notes,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub finished_at: Option<OffsetDateTime>,
    pub gave_up: bool,
}

impl Default for RaceSeat {
    fn default() -> Self {
        Self {
            progress: 0,
            errors: 0,
            grid: EMPTY_GRID,
            notes: EMPTY_NOTES,
            finished_at: None,
            gave_up: false,
        }
    }
}

impl RaceSeat {
    pub fn starting_from(given: &Grid) -> Self {
        Self {
            grid: *given,
            ..Self::default()
        }
    }

    /// Completed or gave up.
    pub fn is_terminal(&self) -> bool {
        self.finished_at.is_some() || self.gave_up
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum Seat {
    Sudoku(RaceSeat),
    Caro { symbol: Symbol },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub connected: bool,
    pub ready: bool,
    pub is_bot: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
    pub seat: Seat,
}

impl Player {
    pub fn race(&self) -> Option<&RaceSeat> {
        match &self.seat {
            Seat::Sudoku(r) => Some(r),
            Seat::Caro { .. } => None,
        }
    }

    pub fn race_mut(&mut self) -> Option<&mut RaceSeat> {
        match &mut self.seat {
            Seat::Sudoku(r) => Some(r),
            Seat::Caro { .. } => None,
        }
    }

    pub fn symbol(&self) -> Option<Symbol> {
        match self.seat {
            Seat::Caro { symbol } => Some(symbol),
            Seat::Sudoku(_) => None,
        }
    }
}

/// A racer's completion, kept even if they leave the room afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finisher {
    pub player_id: PlayerId,
    pub elapsed_ms: u64,
    pub errors: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SudokuGame {
    pub puzzle_id: String,
    pub difficulty: Difficulty,
    pub given: Grid,
    pub solution: Grid,
    /// In completion order
    #[serde(default)]
    pub finishers: Vec<Finisher>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaroMove {
    pub row: usize,
    pub col: usize,
    pub symbol: Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseInfo {
    pub paused_by: PlayerId,
    #[serde(with = "time::serde::rfc3339")]
    pub paused_at: OffsetDateTime,
    pub remaining_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaroGame {
    pub board: Board,
    pub turn: Symbol,
    #[serde(with = "time::serde::rfc3339")]
    pub turn_started_at: OffsetDateTime,
    pub pause: Option<PauseInfo>,
    pub last_move: Option<CaroMove>,
    pub move_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActiveGame {
    Sudoku(SudokuGame),
    Caro(CaroGame),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Completed,
    FiveInRow,
    Draw,
    GaveUp,
    Timeout,
    OpponentLeft,
    AllGaveUp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedGame {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub ended_at: OffsetDateTime,
    pub winner_id: Option<PlayerId>,
    pub reason: EndReason,
    /// Final board or puzzle
    pub game: Option<ActiveGame>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    Playing {
        #[serde(with = "time::serde::rfc3339")]
        started_at: OffsetDateTime,
        game: ActiveGame,
    },
    Finished(FinishedGame),
}

impl RoomStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Playing { .. } => "playing",
            RoomStatus::Finished(_) => "finished",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub code: String,
    pub settings: GameSettings,
    pub host_id: PlayerId,
    pub players: Vec<Player>,
    pub status: RoomStatus,
    pub version: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Room {
    /// Fresh waiting room with `host` seated first and implicitly ready.
    ///
    /// A Caro room with `vs_bot` also seats the bot as `O`.
    pub fn create(host: &Identity, settings: GameSettings, code: String, now: OffsetDateTime) -> Self {
        let host_seat = match settings {
            GameSettings::Sudoku { .. } => Seat::Sudoku(RaceSeat::default()),
            GameSettings::Caro { .. } => Seat::Caro { symbol: Symbol::X },
        };
        let mut players = vec![Player {
            id: host.player_id.clone(),
            display_name: host.display_name.clone(),
            connected: true,
            ready: true,
            is_bot: false,
            joined_at: now,
            seat: host_seat,
        }];
        if let GameSettings::Caro { vs_bot: true } = settings {
            players.push(Player {
                id: BOT_PLAYER_ID.to_string(),
                display_name: BOT_DISPLAY_NAME.to_string(),
                connected: true,
                ready: true,
                is_bot: true,
                joined_at: now,
                seat: Seat::Caro { symbol: Symbol::O },
            });
        }
        Self {
            code,
            settings,
            host_id: host.player_id.clone(),
            players,
            status: RoomStatus::Waiting,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn kind(&self) -> GameKind {
        self.settings.kind()
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn is_member(&self, id: &str) -> bool {
        self.player(id).is_some()
    }

    pub fn is_host(&self, id: &str) -> bool {
        self.host_id == id
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.settings.max_players()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, RoomStatus::Finished(_))
    }

    pub fn has_bot(&self) -> bool {
        self.players.iter().any(|p| p.is_bot)
    }

    /// True when no human remains in the roster.
    pub fn is_abandoned(&self) -> bool {
        self.players.iter().all(|p| p.is_bot)
    }

    pub fn started_at(&self) -> Option<OffsetDateTime> {
        match &self.status {
            RoomStatus::Waiting => None,
            RoomStatus::Playing { started_at, .. } => Some(*started_at),
            RoomStatus::Finished(f) => f.started_at,
        }
    }

    pub fn caro(&self) -> Option<&CaroGame> {
        match &self.status {
            RoomStatus::Playing {
                game: ActiveGame::Caro(g),
                ..
            } => Some(g),
            _ => None,
        }
    }

    pub fn sudoku(&self) -> Option<&SudokuGame> {
        match &self.status {
            RoomStatus::Playing {
                game: ActiveGame::Sudoku(g),
                ..
            } => Some(g),
            _ => None,
        }
    }

    pub fn player_with_symbol(&self, symbol: Symbol) -> Option<&Player> {
        self.players.iter().find(|p| p.symbol() == Some(symbol))
    }

    /// Waiting-room start predicate.
    ///
    /// Sudoku: at least two players and one ready non-host.
    /// Caro: both seats filled and the guest ready.
    pub fn can_start(&self) -> bool {
        let guests_ready = self
            .players
            .iter()
            .filter(|p| p.id != self.host_id)
            .map(|p| p.ready);
        match self.settings {
            GameSettings::Sudoku { .. } => {
                self.players.len() >= MIN_SUDOKU_PLAYERS as usize
                    && guests_ready.into_iter().any(|r| r)
            }
            GameSettings::Caro { .. } => {
                self.players.len() == CARO_PLAYERS && guests_ready.into_iter().all(|r| r)
            }
        }
    }

    /// Symbol for a new Caro joiner: whichever seat is free.
    pub fn free_symbol(&self) -> Symbol {
        if self.player_with_symbol(Symbol::X).is_some() {
            Symbol::O
        } else {
            Symbol::X
        }
    }
}
