use sea_orm::entity::prelude::*;

/// Strike-shaped rows. `severity` 1-5 is a strike, 0 a removed strike and a
/// negative value a release.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "strikes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i64,
    pub moderator_id: Option<i64>,
    pub severity: i32,
    pub comment: Option<String>,
    pub created_at: DateTime,
    pub expired: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
