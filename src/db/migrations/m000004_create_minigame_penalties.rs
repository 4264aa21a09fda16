use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MinigamePenalties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MinigamePenalties::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MinigamePenalties::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MinigamePenalties::Comment).text())
                    .col(
                        ColumnDef::new(MinigamePenalties::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MinigamePenalties::DurationMs)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-minigame-penalties-user-created-unique")
                    .table(MinigamePenalties::Table)
                    .col(MinigamePenalties::UserId)
                    .col(MinigamePenalties::CreatedAt)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MinigamePenalties::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MinigamePenalties {
    Table,
    Id,
    UserId,
    Comment,
    CreatedAt,
    DurationMs,
}
