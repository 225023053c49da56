pub use sea_orm_migration::prelude::*;

mod m20260701_000001_users;
mod m20260701_000002_catalog;
mod m20260702_000001_transactions;
mod m20260702_000002_entitlements;
mod m20260703_000001_wallets;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260701_000001_users::Migration),
            Box::new(m20260701_000002_catalog::Migration),
            Box::new(m20260702_000001_transactions::Migration),
            Box::new(m20260702_000002_entitlements::Migration),
            Box::new(m20260703_000001_wallets::Migration),
        ]
    }
}
