use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One row per room. The full room document lives in `document`; `kind`
/// and `status` are denormalized for queries and retention sweeps.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rooms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    pub kind: String,
    pub status: String,
    pub version: i64,
    #[sea_orm(column_type = "Json")]
    pub document: Json,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::player_progress::Entity")]
    PlayerProgress,
}

impl Related<super::player_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlayerProgress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
