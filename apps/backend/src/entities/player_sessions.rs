use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "player_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "session_id")]
    pub session_id: String,
    #[sea_orm(column_name = "display_name")]
    pub display_name: String,
    /// `guest` or `registered`
    pub kind: String,
    pub wins: i64,
    pub losses: i64,
    pub draws: i64,
    pub points: i64,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "last_seen_at")]
    pub last_seen_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
