pub mod m000001_create_strikes;
pub mod m000002_create_warnings;
pub mod m000003_create_timeouts;
pub mod m000004_create_minigame_penalties;

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m000001_create_strikes::Migration),
            Box::new(m000002_create_warnings::Migration),
            Box::new(m000003_create_timeouts::Migration),
            Box::new(m000004_create_minigame_penalties::Migration),
        ]
    }
}
