use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Warnings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Warnings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Warnings::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Warnings::ModeratorId).big_integer())
                    .col(ColumnDef::new(Warnings::Comment).text())
                    .col(ColumnDef::new(Warnings::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-warnings-user-created-unique")
                    .table(Warnings::Table)
                    .col(Warnings::UserId)
                    .col(Warnings::CreatedAt)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Warnings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Warnings {
    Table,
    Id,
    UserId,
    ModeratorId,
    Comment,
    CreatedAt,
}
