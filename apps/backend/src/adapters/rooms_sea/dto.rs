//! Conversions between room-store rows and domain documents.

use sea_orm::{DbErr, Set};

use crate::domain::progress::{PlayerProgress, ProgressStatus};
use crate::domain::room::Room;
use crate::domain::session::{PlayerSession, PlayerStats, SessionKind};
use crate::entities::{player_progress, player_sessions, rooms};

fn json_err(what: &str, e: serde_json::Error) -> DbErr {
    DbErr::Json(format!("{what}: {e}"))
}

pub fn room_active(room: &Room) -> Result<rooms::ActiveModel, DbErr> {
    let document = serde_json::to_value(room).map_err(|e| json_err("room document", e))?;
    Ok(rooms::ActiveModel {
        code: Set(room.code.clone()),
        kind: Set(room.kind().as_str().to_string()),
        status: Set(room.status.label().to_string()),
        version: Set(room.version),
        document: Set(document),
        created_at: Set(room.created_at),
        updated_at: Set(room.updated_at),
    })
}

pub fn room_from_model(model: rooms::Model) -> Result<Room, DbErr> {
    let mut room: Room =
        serde_json::from_value(model.document).map_err(|e| json_err("room document", e))?;
    // The column is authoritative for concurrency checks.
    room.version = model.version;
    Ok(room)
}

pub fn progress_active(p: &PlayerProgress) -> Result<player_progress::ActiveModel, DbErr> {
    let grid = serde_json::to_value(p.grid).map_err(|e| json_err("progress grid", e))?;
    Ok(player_progress::ActiveModel {
        room_code: Set(p.room_code.clone()),
        player_id: Set(p.player_id.clone()),
        grid: Set(grid),
        mistakes: Set(p.mistakes as i32),
        status: Set(p.status.as_str().to_string()),
        completed_at: Set(p.completed_at),
        elapsed_ms: Set(p.elapsed_ms.map(|ms| ms as i64)),
        updated_at: Set(p.updated_at),
    })
}

pub fn progress_from_model(model: player_progress::Model) -> Result<PlayerProgress, DbErr> {
    let status = ProgressStatus::parse(&model.status)
        .ok_or_else(|| DbErr::Type(format!("unknown progress status '{}'", model.status)))?;
    Ok(PlayerProgress {
        room_code: model.room_code,
        player_id: model.player_id,
        grid: serde_json::from_value(model.grid).map_err(|e| json_err("progress grid", e))?,
        mistakes: model.mistakes.max(0) as u32,
        status,
        completed_at: model.completed_at,
        elapsed_ms: model.elapsed_ms.map(|ms| ms.max(0) as u64),
        updated_at: model.updated_at,
    })
}

pub fn session_active(s: &PlayerSession) -> player_sessions::ActiveModel {
    player_sessions::ActiveModel {
        session_id: Set(s.session_id.clone()),
        display_name: Set(s.display_name.clone()),
        kind: Set(s.kind.as_str().to_string()),
        wins: Set(s.stats.wins),
        losses: Set(s.stats.losses),
        draws: Set(s.stats.draws),
        points: Set(s.stats.points),
        created_at: Set(s.created_at),
        last_seen_at: Set(s.last_seen_at),
    }
}

pub fn session_from_model(model: player_sessions::Model) -> Result<PlayerSession, DbErr> {
    let kind = SessionKind::parse(&model.kind)
        .ok_or_else(|| DbErr::Type(format!("unknown session kind '{}'", model.kind)))?;
    Ok(PlayerSession {
        session_id: model.session_id,
        display_name: model.display_name,
        kind,
        stats: PlayerStats {
            wins: model.wins,
            losses: model.losses,
            draws: model.draws,
            points: model.points,
        },
        created_at: model.created_at,
        last_seen_at: model.last_seen_at,
    })
}

/// Payload for the structured optimistic-lock error.
pub fn lock_payload(expected: i64, actual: i64) -> String {
    format!(
        "{}{{\"expected\":{expected},\"actual\":{actual}}}",
        crate::infra::db_errors::OPTIMISTIC_LOCK_PREFIX
    )
}
