//! Events emitted by room transitions, and the client-facing room snapshot.
//!
//! Snapshots never carry the Sudoku solution. A player's own grid and
//! notes are only included when the snapshot is built for that player.

use serde::Serialize;
use time::OffsetDateTime;

use super::caro::{Board, Symbol};
use super::room::{
    ActiveGame, CaroMove, EndReason, GameKind, GameSettings, Player, Room, RoomStatus, Seat,
};
use super::session::PlayerId;
use super::sudoku::{Cell, Difficulty, Grid, Notes};

/// Who receives an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Room,
    Player(PlayerId),
    /// Everyone in the room except this player
    Others(PlayerId),
}

impl Audience {
    pub fn includes(&self, player_id: &str) -> bool {
        match self {
            Audience::Room => true,
            Audience::Player(id) => id == player_id,
            Audience::Others(id) => id != player_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutCause {
    Turn,
    Disconnect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum RoomEvent {
    PlayerJoined {
        player: PlayerView,
    },
    PlayerLeft {
        player_id: PlayerId,
        #[serde(skip_serializing_if = "Option::is_none")]
        new_host: Option<PlayerId>,
    },
    PlayerReady {
        player_id: PlayerId,
        ready: bool,
    },
    GameStarting {
        countdown: u64,
    },
    GameStarted {
        snapshot: Box<RoomSnapshot>,
    },
    CellUpdate {
        player_id: PlayerId,
        row: usize,
        col: usize,
        value: u8,
        notes: u16,
        correct: bool,
        conflicts: Vec<Cell>,
    },
    MoveMade {
        player_id: PlayerId,
        row: usize,
        col: usize,
        symbol: Symbol,
        next_turn: Option<Symbol>,
        move_count: u32,
    },
    ProgressUpdate {
        player_id: PlayerId,
        progress: u8,
        errors: u32,
    },
    PlayerCompleted {
        player_id: PlayerId,
        elapsed_ms: u64,
        rank: usize,
    },
    PlayerGaveUp {
        player_id: PlayerId,
    },
    GameEnded {
        winner_id: Option<PlayerId>,
        reason: EndReason,
    },
    PlayerDisconnected {
        player_id: PlayerId,
    },
    PlayerReconnected {
        player_id: PlayerId,
    },
    PlayerTimeout {
        player_id: PlayerId,
        cause: TimeoutCause,
    },
    GamePaused {
        paused_by: PlayerId,
        remaining_ms: u64,
    },
    GameResumed {
        resumed_by: PlayerId,
        remaining_ms: u64,
    },
    Cursor {
        player_id: PlayerId,
        row: usize,
        col: usize,
    },
    CellPreview {
        player_id: PlayerId,
        row: usize,
        col: usize,
        value: u8,
    },
}

impl RoomEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::PlayerJoined { .. } => "player_joined",
            RoomEvent::PlayerLeft { .. } => "player_left",
            RoomEvent::PlayerReady { .. } => "player_ready",
            RoomEvent::GameStarting { .. } => "game_starting",
            RoomEvent::GameStarted { .. } => "game_started",
            RoomEvent::CellUpdate { .. } => "cell_update",
            RoomEvent::MoveMade { .. } => "move_made",
            RoomEvent::ProgressUpdate { .. } => "progress_update",
            RoomEvent::PlayerCompleted { .. } => "player_completed",
            RoomEvent::PlayerGaveUp { .. } => "player_gave_up",
            RoomEvent::GameEnded { .. } => "game_ended",
            RoomEvent::PlayerDisconnected { .. } => "player_disconnected",
            RoomEvent::PlayerReconnected { .. } => "player_reconnected",
            RoomEvent::PlayerTimeout { .. } => "player_timeout",
            RoomEvent::GamePaused { .. } => "game_paused",
            RoomEvent::GameResumed { .. } => "game_resumed",
            RoomEvent::Cursor { .. } => "cursor",
            RoomEvent::CellPreview { .. } => "cell_preview",
        }
    }

    /// Kind-namespaced wire name, e.g. `caro:move_made`.
    pub fn wire_name(&self, kind: GameKind) -> String {
        format!("{}:{}", kind.as_str(), self.name())
    }

    /// JSON payload without the enum tag.
    pub fn payload(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.remove("payload").unwrap_or(serde_json::Value::Null)
            }
            _ => serde_json::Value::Null,
        }
    }
}

/// An event plus the connections that should see it.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub audience: Audience,
    pub event: RoomEvent,
}

impl Outbound {
    pub fn room(event: RoomEvent) -> Self {
        Self {
            audience: Audience::Room,
            event,
        }
    }

    pub fn to_player(player_id: impl Into<PlayerId>, event: RoomEvent) -> Self {
        Self {
            audience: Audience::Player(player_id.into()),
            event,
        }
    }

    pub fn to_others(player_id: impl Into<PlayerId>, event: RoomEvent) -> Self {
        Self {
            audience: Audience::Others(player_id.into()),
            event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub display_name: String,
    pub connected: bool,
    pub ready: bool,
    pub is_bot: bool,
    pub is_host: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race: Option<RaceView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceView {
    pub progress: u8,
    pub errors: u32,
    pub finished: bool,
    pub gave_up: bool,
}

impl PlayerView {
    pub fn of(player: &Player, host_id: &str) -> Self {
        let (symbol, race) = match &player.seat {
            Seat::Caro { symbol } => (Some(*symbol), None),
            Seat::Sudoku(r) => (
                None,
                Some(RaceView {
                    progress: r.progress,
                    errors: r.errors,
                    finished: r.finished_at.is_some(),
                    gave_up: r.gave_up,
                }),
            ),
        };
        Self {
            id: player.id.clone(),
            display_name: player.display_name.clone(),
            connected: player.connected,
            ready: player.ready,
            is_bot: player.is_bot,
            is_host: player.id == host_id,
            symbol,
            race,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GameView {
    Sudoku {
        puzzle_id: String,
        difficulty: Difficulty,
        given: Grid,
    },
    Caro {
        board: Board,
        turn: Symbol,
        #[serde(with = "time::serde::rfc3339")]
        turn_started_at: OffsetDateTime,
        paused: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        paused_by: Option<PlayerId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        remaining_ms: Option<u64>,
        last_move: Option<CaroMove>,
        move_count: u32,
    },
}

impl GameView {
    fn of(game: &ActiveGame) -> Self {
        match game {
            ActiveGame::Sudoku(g) => GameView::Sudoku {
                puzzle_id: g.puzzle_id.clone(),
                difficulty: g.difficulty,
                given: g.given,
            },
            ActiveGame::Caro(g) => GameView::Caro {
                board: g.board.clone(),
                turn: g.turn,
                turn_started_at: g.turn_started_at,
                paused: g.pause.is_some(),
                paused_by: g.pause.as_ref().map(|p| p.paused_by.clone()),
                remaining_ms: g.pause.as_ref().map(|p| p.remaining_ms),
                last_move: g.last_move,
                move_count: g.move_count,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub winner_id: Option<PlayerId>,
    pub reason: EndReason,
    #[serde(with = "time::serde::rfc3339")]
    pub ended_at: OffsetDateTime,
}

/// The viewer's own race grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnRace {
    pub grid: Grid,
    pub notes: Notes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSnapshot {
    pub code: String,
    pub kind: GameKind,
    pub settings: GameSettings,
    pub status: &'static str,
    pub host_id: PlayerId,
    pub players: Vec<PlayerView>,
    pub version: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    pub game: Option<GameView>,
    pub result: Option<ResultView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub me: Option<OwnRace>,
}

impl RoomSnapshot {
    /// Snapshot as seen by `viewer` (or by the whole room when `None`).
    pub fn of(room: &Room, viewer: Option<&str>) -> Self {
        let (game, result) = match &room.status {
            RoomStatus::Waiting => (None, None),
            RoomStatus::Playing { game, .. } => (Some(GameView::of(game)), None),
            RoomStatus::Finished(f) => (
                f.game.as_ref().map(GameView::of),
                Some(ResultView {
                    winner_id: f.winner_id.clone(),
                    reason: f.reason,
                    ended_at: f.ended_at,
                }),
            ),
        };
        let me = viewer
            .and_then(|id| room.player(id))
            .and_then(Player::race)
            .filter(|_| !matches!(room.status, RoomStatus::Waiting))
            .map(|r| OwnRace {
                grid: r.grid,
                notes: r.notes,
            });
        Self {
            code: room.code.clone(),
            kind: room.kind(),
            settings: room.settings,
            status: room.status.label(),
            host_id: room.host_id.clone(),
            players: room
                .players
                .iter()
                .map(|p| PlayerView::of(p, &room.host_id))
                .collect(),
            version: room.version,
            started_at: room.started_at(),
            game,
            result,
            me,
        }
    }
}
