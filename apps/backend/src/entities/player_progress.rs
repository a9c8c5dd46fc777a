use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "player_progress")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "room_code")]
    pub room_code: String,
    #[sea_orm(primary_key, auto_increment = false, column_name = "player_id")]
    pub player_id: String,
    #[sea_orm(column_type = "Json")]
    pub grid: Json,
    pub mistakes: i32,
    pub status: String,
    #[sea_orm(column_name = "completed_at")]
    pub completed_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "elapsed_ms")]
    pub elapsed_ms: Option<i64>,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rooms::Entity",
        from = "Column::RoomCode",
        to = "super::rooms::Column::Code",
        on_delete = "Cascade"
    )]
    Room,
}

impl Related<super::rooms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Room.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
