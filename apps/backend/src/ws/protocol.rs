use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::events::RoomSnapshot;
use crate::domain::sudoku::Grid;
use crate::domain::transitions::Move;

pub const PROTOCOL_VERSION: i32 = 1;

fn default_ready() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    Hello {
        protocol: i32,
    },
    JoinRoom {
        code: String,
    },
    LeaveRoom,
    Ready {
        #[serde(default = "default_ready")]
        ready: bool,
    },
    Start,
    Move {
        #[serde(rename = "move")]
        mv: Move,
    },
    Complete {
        grid: Grid,
    },
    GiveUp,
    Pause,
    Resume,
    Leave,
    Cursor {
        row: usize,
        col: usize,
    },
    CellPreview {
        row: usize,
        col: usize,
        value: u8,
    },
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    HelloAck {
        protocol: i32,
        player_id: String,
    },

    Ack {
        message: &'static str,
    },

    RoomState {
        room: String,
        snapshot: RoomSnapshot,
    },

    /// Room event, namespaced by game kind (`sudoku:cell_update`)
    Event {
        event: String,
        room: String,
        payload: Value,
    },

    Error {
        code: String,
        message: String,
    },
}

/// Protocol-level failures. Rejected game actions carry the domain
/// error code instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsErrorCode {
    BadProtocol,
    BadRequest,
    NotInRoom,
}

impl WsErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WsErrorCode::BadProtocol => "bad_protocol",
            WsErrorCode::BadRequest => "bad_request",
            WsErrorCode::NotInRoom => "not_in_room",
        }
    }
}
