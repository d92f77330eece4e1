#[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
mod common;
mod error;
pub mod memory;
#[cfg(feature = "database-postgres")]
pub mod postgres;
pub mod repos;
#[cfg(feature = "database-sqlite")]
pub mod sqlite;

#[cfg(all(test, any(feature = "database-sqlite", feature = "database-postgres")))]
pub mod tests;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use repos::*;

use crate::config::DatabaseConfig;

/// Primary pool plus an optional read replica.
#[cfg(feature = "database-postgres")]
pub struct PgPoolPair {
    pub write: sqlx::PgPool,
    pub read: Option<sqlx::PgPool>,
}

struct CachedRepos {
    housekeeping_metadata: Arc<dyn HousekeepingMetadataRepo>,
    housekeeping_paths: Arc<dyn HousekeepingPathRepo>,
}

enum PoolStorage {
    Memory,
    #[cfg(feature = "database-sqlite")]
    Sqlite(sqlx::SqlitePool),
    #[cfg(feature = "database-postgres")]
    Postgres(PgPoolPair),
}

/// Handle to the configured record store.
///
/// Repositories are created once and handed out as `Arc<dyn ...>` so services
/// never depend on a concrete backend.
pub struct DbPool {
    inner: PoolStorage,
    repos: CachedRepos,
}

impl DbPool {
    /// Build an in-process store seeded with `fixtures`.
    pub fn from_fixtures(fixtures: memory::Fixtures) -> Self {
        let metadata = memory::MemoryHousekeepingMetadataRepo::new();
        for record in fixtures.metadata {
            metadata.insert(record);
        }
        let paths = memory::MemoryHousekeepingPathRepo::new();
        for record in fixtures.paths {
            paths.insert(record);
        }
        Self::from_memory(metadata, paths)
    }

    pub fn from_memory(
        metadata: memory::MemoryHousekeepingMetadataRepo,
        paths: memory::MemoryHousekeepingPathRepo,
    ) -> Self {
        DbPool {
            inner: PoolStorage::Memory,
            repos: CachedRepos {
                housekeeping_metadata: Arc::new(metadata),
                housekeeping_paths: Arc::new(paths),
            },
        }
    }

    #[cfg(feature = "database-sqlite")]
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        let repos = CachedRepos {
            housekeeping_metadata: Arc::new(sqlite::SqliteHousekeepingMetadataRepo::new(
                pool.clone(),
            )),
            housekeeping_paths: Arc::new(sqlite::SqliteHousekeepingPathRepo::new(pool.clone())),
        };
        DbPool {
            inner: PoolStorage::Sqlite(pool),
            repos,
        }
    }

    #[cfg(feature = "database-postgres")]
    pub fn from_postgres(write_pool: sqlx::PgPool, read_pool: Option<sqlx::PgPool>) -> Self {
        let repos = CachedRepos {
            housekeeping_metadata: Arc::new(postgres::PostgresHousekeepingMetadataRepo::new(
                write_pool.clone(),
                read_pool.clone(),
            )),
            housekeeping_paths: Arc::new(postgres::PostgresHousekeepingPathRepo::new(
                write_pool.clone(),
                read_pool.clone(),
            )),
        };
        DbPool {
            inner: PoolStorage::Postgres(PgPoolPair {
                write: write_pool,
                read: read_pool,
            }),
            repos,
        }
    }

    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        match config {
            DatabaseConfig::None => Err(DbError::NotConfigured),
            DatabaseConfig::Memory(cfg) => {
                let fixtures = match &cfg.fixtures {
                    Some(path) => {
                        tracing::info!(path = %path, "Loading housekeeping fixtures");
                        memory::Fixtures::from_file(path)?
                    }
                    None => memory::Fixtures::default(),
                };
                Ok(Self::from_fixtures(fixtures))
            }
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(cfg) => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(cfg.max_connections)
                    .connect_with(
                        sqlx::sqlite::SqliteConnectOptions::new()
                            .filename(&cfg.path)
                            .create_if_missing(cfg.create_if_missing)
                            .journal_mode(if cfg.wal_mode {
                                sqlx::sqlite::SqliteJournalMode::Wal
                            } else {
                                sqlx::sqlite::SqliteJournalMode::Delete
                            })
                            .busy_timeout(std::time::Duration::from_millis(cfg.busy_timeout_ms)),
                    )
                    .await?;

                Ok(Self::from_sqlite(pool))
            }
            #[cfg(feature = "database-postgres")]
            DatabaseConfig::Postgres(cfg) => {
                let options = || {
                    sqlx::postgres::PgPoolOptions::new()
                        .min_connections(cfg.min_connections)
                        .max_connections(cfg.max_connections)
                        .acquire_timeout(std::time::Duration::from_secs(cfg.connect_timeout_secs))
                        .idle_timeout(std::time::Duration::from_secs(cfg.idle_timeout_secs))
                };

                let connect_options = |url: &str| -> DbResult<sqlx::postgres::PgConnectOptions> {
                    Ok(url
                        .parse::<sqlx::postgres::PgConnectOptions>()?
                        .ssl_mode(cfg.ssl_mode.to_sqlx()))
                };

                let write_pool = options().connect_with(connect_options(&cfg.url)?).await?;

                let read_pool = if let Some(read_url) = &cfg.read_url {
                    tracing::info!("Configuring read replica pool");
                    Some(options().connect_with(connect_options(read_url)?).await?)
                } else {
                    None
                };

                Ok(Self::from_postgres(write_pool, read_pool))
            }
        }
    }

    /// Run database migrations using sqlx's migration runner.
    /// Migrations always run on the primary (write) pool; the memory store has
    /// no schema.
    pub async fn run_migrations(&self) -> DbResult<()> {
        match &self.inner {
            PoolStorage::Memory => Ok(()),
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                tracing::info!("Running SQLite migrations");
                sqlx::migrate!("./migrations_sqlx/sqlite").run(pool).await?;
                tracing::info!("SQLite migrations completed successfully");
                Ok(())
            }
            #[cfg(feature = "database-postgres")]
            PoolStorage::Postgres(pools) => {
                tracing::info!("Running PostgreSQL migrations");
                sqlx::migrate!("./migrations_sqlx/postgres")
                    .run(&pools.write)
                    .await?;
                tracing::info!("PostgreSQL migrations completed successfully");
                Ok(())
            }
        }
    }

    /// Get housekeeping metadata repository
    pub fn housekeeping_metadata(&self) -> Arc<dyn HousekeepingMetadataRepo> {
        Arc::clone(&self.repos.housekeeping_metadata)
    }

    /// Get housekeeping path repository
    pub fn housekeeping_paths(&self) -> Arc<dyn HousekeepingPathRepo> {
        Arc::clone(&self.repos.housekeeping_paths)
    }

    /// Short name of the backing store, for logs and health output.
    pub fn backend(&self) -> &'static str {
        match &self.inner {
            PoolStorage::Memory => "memory",
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(_) => "sqlite",
            #[cfg(feature = "database-postgres")]
            PoolStorage::Postgres(_) => "postgres",
        }
    }

    /// Health check for database connectivity
    pub async fn health_check(&self) -> DbResult<()> {
        match &self.inner {
            PoolStorage::Memory => Ok(()),
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            #[cfg(feature = "database-postgres")]
            PoolStorage::Postgres(pools) => {
                sqlx::query("SELECT 1").execute(&pools.write).await?;
                if let Some(read) = &pools.read {
                    sqlx::query("SELECT 1").execute(read).await?;
                }
                Ok(())
            }
        }
    }
}
