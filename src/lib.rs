pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod infrastructure;
pub mod schema;

use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub use application::converter::PurchaseListConverter;
pub use application::numbering_service::NumberingService;
pub use application::order_service::OrderService;
pub use application::purchase_list_service::PurchaseListService;
pub use application::transfer_service::TransferService;
pub use config::{Config, ConfigError};
pub use db::{create_pool, DbPool};
pub use domain::errors::DomainError;
pub use infrastructure::memory_store::InMemoryStore;
pub use infrastructure::pg_store::PgStore;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), DomainError> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DomainError::Internal(format!("migration failed: {e}")))?;
    for version in applied {
        log::info!("Applied migration {}", version);
    }
    Ok(())
}
