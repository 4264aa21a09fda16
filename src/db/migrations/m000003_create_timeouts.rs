use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Timeouts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Timeouts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Timeouts::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Timeouts::ModeratorId).big_integer())
                    .col(ColumnDef::new(Timeouts::Comment).text())
                    .col(ColumnDef::new(Timeouts::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Timeouts::DurationMs).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-timeouts-user-created-unique")
                    .table(Timeouts::Table)
                    .col(Timeouts::UserId)
                    .col(Timeouts::CreatedAt)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Timeouts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Timeouts {
    Table,
    Id,
    UserId,
    ModeratorId,
    Comment,
    CreatedAt,
    DurationMs,
}
