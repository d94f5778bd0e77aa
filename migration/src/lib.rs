pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_banners_and_catalog;
mod m20261001_000002_create_player_progress;
mod m20261001_000003_create_pull_ledger;
mod m20261001_000004_seed_pool_entries;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_banners_and_catalog::Migration),
            Box::new(m20261001_000002_create_player_progress::Migration),
            Box::new(m20261001_000003_create_pull_ledger::Migration),
            Box::new(m20261001_000004_seed_pool_entries::Migration),
        ]
    }
}
