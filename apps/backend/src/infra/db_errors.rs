//! SeaORM -> DomainError translation helpers.
//!
//! Adapters convert `sea_orm::DbErr` into `DomainError` here, and higher
//! layers map `DomainError` to `AppError` via `From`.

use tracing::{error, warn};

use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind};
use crate::trace_ctx;

/// Prefix the SeaORM store puts on a `DbErr::Custom` when a version-filtered
/// update touched no rows.
pub const OPTIMISTIC_LOCK_PREFIX: &str = "OPTIMISTIC_LOCK:";
/// Prefix for a room that vanished between load and save.
pub const ROOM_NOT_FOUND_PREFIX: &str = "ROOM_NOT_FOUND:";

fn mentions_sqlstate(msg: &str, code: &str) -> bool {
    msg.contains(code) || msg.contains(&format!("SQLSTATE({code})"))
}

/// Extract table.column from SQLite "UNIQUE constraint failed: table.column" messages.
fn extract_sqlite_table_column(error_msg: &str) -> Option<&str> {
    let marker = "UNIQUE constraint failed: ";
    let start = error_msg.find(marker)? + marker.len();
    error_msg[start..].split_whitespace().next()
}

fn map_unique_violation(error_msg: &str) -> (ConflictKind, &'static str) {
    if let Some(table_column) = extract_sqlite_table_column(error_msg) {
        match table_column {
            "rooms.code" => return (ConflictKind::JoinCodeConflict, "Room code already exists"),
            "player_sessions.session_id" => {
                return (ConflictKind::Other("SessionExists".into()), "Session already exists")
            }
            _ => {}
        }
    }
    if error_msg.contains("rooms_pkey") || error_msg.contains("rooms_code_key") {
        return (ConflictKind::JoinCodeConflict, "Room code already exists");
    }
    if error_msg.contains("player_sessions_pkey") {
        return (ConflictKind::Other("SessionExists".into()), "Session already exists");
    }
    (ConflictKind::Other("Unique".into()), "Unique constraint violation")
}

/// Translate a `DbErr` into a `DomainError` with sanitized detail.
pub fn map_db_err(e: sea_orm::DbErr) -> DomainError {
    let error_msg = e.to_string();
    let trace_id = trace_ctx::trace_id();

    match &e {
        sea_orm::DbErr::RecordNotFound(_) => {
            return DomainError::not_found(NotFoundKind::Other("Record".into()), "Record not found");
        }
        sea_orm::DbErr::Custom(msg) if msg.starts_with(ROOM_NOT_FOUND_PREFIX) => {
            let code = msg.trim_start_matches(ROOM_NOT_FOUND_PREFIX);
            warn!(trace_id = %trace_id, room_code = %code, "Room not found");
            return DomainError::not_found(NotFoundKind::Room, format!("Room {code} not found"));
        }
        sea_orm::DbErr::Custom(msg) if msg.starts_with(OPTIMISTIC_LOCK_PREFIX) => {
            #[derive(serde::Deserialize)]
            struct LockInfo {
                expected: i64,
                actual: i64,
            }

            let json_str = msg.trim_start_matches(OPTIMISTIC_LOCK_PREFIX);
            if let Ok(info) = serde_json::from_str::<LockInfo>(json_str) {
                warn!(
                    trace_id = %trace_id,
                    expected = info.expected,
                    actual = info.actual,
                    "Optimistic lock conflict detected"
                );
                return DomainError::conflict(
                    ConflictKind::OptimisticLock,
                    format!(
                        "Room was modified concurrently (expected version {}, actual version {})",
                        info.expected, info.actual
                    ),
                );
            }

            warn!(trace_id = %trace_id, "Optimistic lock conflict detected (version info unavailable)");
            return DomainError::conflict(
                ConflictKind::OptimisticLock,
                "Room was modified concurrently; please retry",
            );
        }
        sea_orm::DbErr::Json(_) | sea_orm::DbErr::Type(_) => {
            error!(trace_id = %trace_id, raw_error = %error_msg, "Stored document could not be decoded");
            return DomainError::infra(InfraErrorKind::DataCorruption, "Stored document is corrupt");
        }
        sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => {
            warn!(trace_id = %trace_id, raw_error = %error_msg, "Database unavailable");
            return DomainError::infra(InfraErrorKind::DbUnavailable, "Database unavailable");
        }
        _ => {}
    }

    if mentions_sqlstate(&error_msg, "23505")
        || error_msg.contains("duplicate key value violates unique constraint")
        || error_msg.contains("UNIQUE constraint failed")
    {
        warn!(trace_id = %trace_id, raw_error = %error_msg, "Unique constraint violation");
        let (kind, detail) = map_unique_violation(&error_msg);
        return DomainError::conflict(kind, detail);
    }

    if mentions_sqlstate(&error_msg, "23514") {
        warn!(trace_id = %trace_id, raw_error = %error_msg, "Check constraint violation");
        return DomainError::validation(
            ValidationKind::Other("CheckViolation".into()),
            "Check constraint violation",
        );
    }

    if error_msg.contains("timeout") || error_msg.contains("pool") {
        warn!(trace_id = %trace_id, raw_error = %error_msg, "Database timeout or pool issue");
        return DomainError::infra(InfraErrorKind::Timeout, "Database timeout");
    }

    error!(trace_id = %trace_id, raw_error = %error_msg, "Unhandled database error");
    DomainError::infra(InfraErrorKind::Other("DbErr".into()), "Database operation failed")
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        map_db_err(e)
    }
}
