//! Schema migrations for the training tables.
//!
//! The importer writes into the same schema the application serves from, so
//! it brings the database up to date before touching any row.

use sqlx::{PgPool, migrate::Migrator};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations.
///
/// This is idempotent - migrations that have already been applied will be skipped.
///
/// # Arguments
/// * `pool` - PostgreSQL connection pool
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    log::info!("checking database migration state");

    MIGRATOR.run(pool).await?;

    log::info!("database migrations up to date");
    Ok(())
}
