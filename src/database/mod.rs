//! Database plumbing: pool setup and schema migrations.

pub mod migration;

pub use migration::{MIGRATOR, run_migrations};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Open a connection pool to the import target.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    log::debug!("connected with up to {} connections", max_connections);
    Ok(pool)
}
