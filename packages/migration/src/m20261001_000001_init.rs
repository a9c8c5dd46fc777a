use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Rooms {
    Table,
    Code,
    Kind,
    Status,
    Version,
    Document,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PlayerProgress {
    Table,
    RoomCode,
    PlayerId,
    Grid,
    Mistakes,
    Status,
    CompletedAt,
    ElapsedMs,
    UpdatedAt,
}

#[derive(Iden)]
enum PlayerSessions {
    Table,
    SessionId,
    DisplayName,
    Kind,
    Wins,
    Losses,
    Draws,
    Points,
    CreatedAt,
    LastSeenAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // rooms
        manager
            .create_table(
                Table::create()
                    .table(Rooms::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rooms::Code).string().not_null().primary_key())
                    .col(ColumnDef::new(Rooms::Kind).string().not_null())
                    .col(ColumnDef::new(Rooms::Status).string().not_null())
                    .col(
                        ColumnDef::new(Rooms::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Rooms::Document).json().not_null())
                    .col(
                        ColumnDef::new(Rooms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rooms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Retention sweeps scan by last activity
        manager
            .create_index(
                Index::create()
                    .name("ix_rooms_updated_at")
                    .table(Rooms::Table)
                    .col(Rooms::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        // player_progress
        manager
            .create_table(
                Table::create()
                    .table(PlayerProgress::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PlayerProgress::RoomCode).string().not_null())
                    .col(ColumnDef::new(PlayerProgress::PlayerId).string().not_null())
                    .col(ColumnDef::new(PlayerProgress::Grid).json().not_null())
                    .col(
                        ColumnDef::new(PlayerProgress::Mistakes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(PlayerProgress::Status).string().not_null())
                    .col(
                        ColumnDef::new(PlayerProgress::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(PlayerProgress::ElapsedMs).big_integer().null())
                    .col(
                        ColumnDef::new(PlayerProgress::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(PlayerProgress::RoomCode)
                            .col(PlayerProgress::PlayerId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_player_progress_room")
                            .from(PlayerProgress::Table, PlayerProgress::RoomCode)
                            .to(Rooms::Table, Rooms::Code)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // player_sessions
        manager
            .create_table(
                Table::create()
                    .table(PlayerSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlayerSessions::SessionId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PlayerSessions::DisplayName).string().not_null())
                    .col(
                        ColumnDef::new(PlayerSessions::Kind)
                            .string()
                            .not_null()
                            .default("guest"),
                    )
                    .col(
                        ColumnDef::new(PlayerSessions::Wins)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PlayerSessions::Losses)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PlayerSessions::Draws)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PlayerSessions::Points)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PlayerSessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlayerSessions::LastSeenAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_player_sessions_kind_last_seen")
                    .table(PlayerSessions::Table)
                    .col(PlayerSessions::Kind)
                    .col(PlayerSessions::LastSeenAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // drop in reverse order + drop index before table
        manager
            .drop_index(
                Index::drop()
                    .name("ix_player_sessions_kind_last_seen")
                    .table(PlayerSessions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(PlayerSessions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PlayerProgress::Table).to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("ix_rooms_updated_at")
                    .table(Rooms::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Rooms::Table).to_owned())
            .await?;

        Ok(())
    }
}
