//! Schema migrations.
//!
//! Run with `Migrator::up(&conn, None)` before serving requests. The binary
//! does this at startup; the tests do it against in-memory SQLite.

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_session_table;
mod m20240101_000002_create_users_table;
mod m20240101_000003_create_tennis_sessions_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    // Keep our bookkeeping table apart from any other migrator sharing the database
    fn migration_table_name() -> sea_orm::DynIden {
        Alias::new("courtside_migrations").into_iden()
    }

    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_session_table::Migration),
            Box::new(m20240101_000002_create_users_table::Migration),
            Box::new(m20240101_000003_create_tennis_sessions_table::Migration),
        ]
    }
}
