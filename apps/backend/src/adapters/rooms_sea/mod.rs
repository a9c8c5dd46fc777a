//! SeaORM room store - generic over ConnectionTrait, with `SeaStore` as the
//! `RoomStore` implementation used in production.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use time::OffsetDateTime;
use tracing::debug;

use crate::domain::progress::PlayerProgress;
use crate::domain::room::Room;
use crate::domain::session::{PlayerSession, SessionKind};
use crate::entities::{player_progress, player_sessions, rooms};
use crate::errors::domain::DomainError;
use crate::infra::db_errors::ROOM_NOT_FOUND_PREFIX;
use crate::repos::{PurgeReport, RetentionPolicy, RoomStore};

pub mod dto;

// Adapter functions return DbErr; SeaStore maps to DomainError via From<DbErr>.

pub async fn find_room<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    code: &str,
) -> Result<Option<Room>, sea_orm::DbErr> {
    rooms::Entity::find_by_id(code.to_string())
        .one(conn)
        .await?
        .map(dto::room_from_model)
        .transpose()
}

pub async fn insert_room<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    room: &Room,
) -> Result<(), sea_orm::DbErr> {
    rooms::Entity::insert(dto::room_active(room)?)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// Write `room` when the stored version equals `expected_version`.
///
/// Zero affected rows means either the room is gone or someone else saved
/// first; the row is re-read to tell the two apart.
pub async fn save_room<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    room: &Room,
    expected_version: i64,
) -> Result<Room, sea_orm::DbErr> {
    let mut saved = room.clone();
    saved.version = expected_version + 1;
    let document = serde_json::to_value(&saved)
        .map_err(|e| sea_orm::DbErr::Json(format!("room document: {e}")))?;

    let result = rooms::Entity::update_many()
        .col_expr(rooms::Column::Document, Expr::val(document).into())
        .col_expr(
            rooms::Column::Status,
            Expr::val(saved.status.label().to_string()).into(),
        )
        .col_expr(rooms::Column::UpdatedAt, Expr::val(saved.updated_at).into())
        .col_expr(rooms::Column::Version, Expr::col(rooms::Column::Version).add(1))
        .filter(rooms::Column::Code.eq(room.code.as_str()))
        .filter(rooms::Column::Version.eq(expected_version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        let current = rooms::Entity::find_by_id(room.code.clone()).one(conn).await?;
        return Err(match current {
            Some(row) => sea_orm::DbErr::Custom(dto::lock_payload(expected_version, row.version)),
            None => sea_orm::DbErr::Custom(format!("{ROOM_NOT_FOUND_PREFIX}{}", room.code)),
        });
    }
    Ok(saved)
}

/// Delete the room and its progress rows in one transaction.
pub async fn delete_room<C>(conn: &C, code: &str) -> Result<(), sea_orm::DbErr>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    let txn = conn.begin().await?;
    player_progress::Entity::delete_many()
        .filter(player_progress::Column::RoomCode.eq(code))
        .exec(&txn)
        .await?;
    rooms::Entity::delete_by_id(code.to_string())
        .exec(&txn)
        .await?;
    txn.commit().await
}

pub async fn find_progress<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    code: &str,
    player_id: &str,
) -> Result<Option<PlayerProgress>, sea_orm::DbErr> {
    player_progress::Entity::find_by_id((code.to_string(), player_id.to_string()))
        .one(conn)
        .await?
        .map(dto::progress_from_model)
        .transpose()
}

pub async fn upsert_progress<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    progress: &PlayerProgress,
) -> Result<(), sea_orm::DbErr> {
    use player_progress::Column;

    player_progress::Entity::insert(dto::progress_active(progress)?)
        .on_conflict(
            OnConflict::columns([Column::RoomCode, Column::PlayerId])
                .update_columns([
                    Column::Grid,
                    Column::Mistakes,
                    Column::Status,
                    Column::CompletedAt,
                    Column::ElapsedMs,
                    Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

pub async fn list_progress<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    code: &str,
) -> Result<Vec<PlayerProgress>, sea_orm::DbErr> {
    player_progress::Entity::find()
        .filter(player_progress::Column::RoomCode.eq(code))
        .order_by_asc(player_progress::Column::PlayerId)
        .all(conn)
        .await?
        .into_iter()
        .map(dto::progress_from_model)
        .collect()
}

pub async fn find_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_id: &str,
) -> Result<Option<PlayerSession>, sea_orm::DbErr> {
    player_sessions::Entity::find_by_id(session_id.to_string())
        .one(conn)
        .await?
        .map(dto::session_from_model)
        .transpose()
}

pub async fn upsert_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session: &PlayerSession,
) -> Result<(), sea_orm::DbErr> {
    use player_sessions::Column;

    player_sessions::Entity::insert(dto::session_active(session))
        .on_conflict(
            OnConflict::column(Column::SessionId)
                .update_columns([
                    Column::DisplayName,
                    Column::Kind,
                    Column::Wins,
                    Column::Losses,
                    Column::Draws,
                    Column::Points,
                    Column::LastSeenAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

pub async fn purge_expired<C>(
    conn: &C,
    now: OffsetDateTime,
    policy: &RetentionPolicy,
) -> Result<PurgeReport, sea_orm::DbErr>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    let txn = conn.begin().await?;

    let expired: Vec<String> = rooms::Entity::find()
        .select_only()
        .column(rooms::Column::Code)
        .filter(rooms::Column::UpdatedAt.lt(policy.room_cutoff(now)))
        .into_tuple()
        .all(&txn)
        .await?;

    let mut report = PurgeReport::default();
    if !expired.is_empty() {
        player_progress::Entity::delete_many()
            .filter(player_progress::Column::RoomCode.is_in(expired.clone()))
            .exec(&txn)
            .await?;
        report.rooms = rooms::Entity::delete_many()
            .filter(rooms::Column::Code.is_in(expired))
            .exec(&txn)
            .await?
            .rows_affected;
    }

    report.sessions = player_sessions::Entity::delete_many()
        .filter(player_sessions::Column::Kind.eq(SessionKind::Guest.as_str()))
        .filter(player_sessions::Column::LastSeenAt.lt(policy.session_cutoff(now)))
        .exec(&txn)
        .await?
        .rows_affected;

    txn.commit().await?;
    debug!(rooms = report.rooms, sessions = report.sessions, "Purged expired rows");
    Ok(report)
}

/// `RoomStore` over a SeaORM connection (Postgres or SQLite).
#[derive(Debug, Clone)]
pub struct SeaStore {
    db: DatabaseConnection,
}

impl SeaStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl RoomStore for SeaStore {
    async fn find_room(&self, code: &str) -> Result<Option<Room>, DomainError> {
        Ok(find_room(&self.db, code).await?)
    }

    async fn insert_room(&self, room: &Room) -> Result<(), DomainError> {
        Ok(insert_room(&self.db, room).await?)
    }

    async fn save_room(&self, room: &Room, expected_version: i64) -> Result<Room, DomainError> {
        Ok(save_room(&self.db, room, expected_version).await?)
    }

    async fn delete_room(&self, code: &str) -> Result<(), DomainError> {
        Ok(delete_room(&self.db, code).await?)
    }

    async fn find_progress(
        &self,
        code: &str,
        player_id: &str,
    ) -> Result<Option<PlayerProgress>, DomainError> {
        Ok(find_progress(&self.db, code, player_id).await?)
    }

    async fn save_progress(&self, progress: &PlayerProgress) -> Result<(), DomainError> {
        Ok(upsert_progress(&self.db, progress).await?)
    }

    async fn list_progress(&self, code: &str) -> Result<Vec<PlayerProgress>, DomainError> {
        Ok(list_progress(&self.db, code).await?)
    }

    async fn find_session(&self, session_id: &str) -> Result<Option<PlayerSession>, DomainError> {
        Ok(find_session(&self.db, session_id).await?)
    }

    async fn upsert_session(&self, session: &PlayerSession) -> Result<(), DomainError> {
        Ok(upsert_session(&self.db, session).await?)
    }

    async fn purge_expired(
        &self,
        now: OffsetDateTime,
        policy: &RetentionPolicy,
    ) -> Result<PurgeReport, DomainError> {
        Ok(purge_expired(&self.db, now, policy).await?)
    }
}
