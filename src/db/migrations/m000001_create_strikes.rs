use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Strikes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Strikes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Strikes::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Strikes::ModeratorId).big_integer())
                    .col(ColumnDef::new(Strikes::Severity).integer().not_null())
                    .col(ColumnDef::new(Strikes::Comment).text())
                    .col(ColumnDef::new(Strikes::CreatedAt).date_time().not_null())
                    .col(
                        ColumnDef::new(Strikes::Expired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // Duplicate event delivery collides here and is dropped
        manager
            .create_index(
                Index::create()
                    .name("idx-strikes-user-created-unique")
                    .table(Strikes::Table)
                    .col(Strikes::UserId)
                    .col(Strikes::CreatedAt)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Strikes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Strikes {
    Table,
    Id,
    UserId,
    ModeratorId,
    Severity,
    Comment,
    CreatedAt,
    Expired,
}
