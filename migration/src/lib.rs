pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_profiles;
mod m20251001_000002_create_games;
mod m20251001_000003_create_purchases;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_profiles::Migration),
            Box::new(m20251001_000002_create_games::Migration),
            Box::new(m20251001_000003_create_purchases::Migration),
        ]
    }
}
