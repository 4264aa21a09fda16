use sea_orm::entity::prelude::*;

/// Timed penalties issued without a strike. `moderator_id` is null for self-timeouts.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "timeouts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i64,
    pub moderator_id: Option<i64>,
    pub comment: Option<String>,
    pub created_at: DateTime,
    pub duration_ms: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
