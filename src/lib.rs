pub mod config;
pub mod database;
pub mod error;
pub mod import;
pub mod input;
pub mod models;
pub mod store;

pub use config::ImporterConfig;
pub use error::{ImportError, InputError};
pub use import::{HistoryImporter, ImportStats, ProgramSettings};
pub use store::{ImportStore, MemoryStore, PgStore, StoreError};

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    pub use database::{TestDatabase, TestDatabaseError};

    pub mod database {
        use crate::database::MIGRATOR;
        use log::LevelFilter;
        use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use sqlx::{ConnectOptions, PgPool};
        use testcontainers::ImageExt;
        use testcontainers_modules::postgres::Postgres;
        use testcontainers_modules::testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Disposable, fully migrated Postgres database for integration tests.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            /// Launch a Postgres container and apply every migration.
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().with_tag("16-alpine").start().await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                let options: PgConnectOptions = url.parse()?;
                let options = options.log_statements(LevelFilter::Off);
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(options)
                    .await?;

                MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    container: Some(container),
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close pool connections and stop the container.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }
                if let Some(container) = self.container.take() {
                    drop(container);
                }
                Ok(())
            }
        }
    }
}
