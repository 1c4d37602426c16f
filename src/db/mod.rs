mod error;
pub mod memory;
pub mod repos;
pub mod seed;
#[cfg(feature = "database-sqlite")]
pub mod sqlite;

#[cfg(test)]
pub mod tests;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use repos::*;
pub use seed::SeedFile;

use crate::config::DatabaseConfig;

/// Cached repository trait objects, created once at startup.
struct CachedRepos {
    principals: Arc<dyn PrincipalRepo>,
    authorities: Arc<dyn AuthorityRepo>,
}

enum PoolStorage {
    Memory(Arc<MemoryStore>),
    #[cfg(feature = "database-sqlite")]
    Sqlite(sqlx::SqlitePool),
}

/// Identity and permission store handle.
///
/// Repositories are cached at construction time to avoid allocation on each access.
pub struct DbPool {
    inner: PoolStorage,
    repos: CachedRepos,
}

impl DbPool {
    /// Create a DbPool backed by an in-memory store.
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        let repos = CachedRepos {
            principals: store.clone(),
            authorities: store.clone(),
        };
        DbPool {
            inner: PoolStorage::Memory(store),
            repos,
        }
    }

    /// Create a DbPool from an existing SQLite pool.
    /// Primarily useful for testing.
    #[cfg(feature = "database-sqlite")]
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        let repos = CachedRepos {
            principals: Arc::new(sqlite::SqlitePrincipalRepo::new(pool.clone())),
            authorities: Arc::new(sqlite::SqliteAuthorityRepo::new(pool.clone())),
        };
        DbPool {
            inner: PoolStorage::Sqlite(pool),
            repos,
        }
    }

    /// Create a store from configuration.
    ///
    /// The memory backend is seeded here. SQLite is only connected; callers
    /// run [`DbPool::run_migrations`] and [`DbPool::import_seed`] as needed.
    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        match config {
            DatabaseConfig::Memory(cfg) => {
                let store = match &cfg.seed_file {
                    Some(path) => {
                        tracing::info!(path = %path.display(), "Loading seed file into memory store");
                        MemoryStore::from_seed_file(path)?
                    }
                    None => MemoryStore::new(),
                };
                Ok(Self::from_memory(Arc::new(store)))
            }
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(cfg) => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(cfg.max_connections)
                    .connect_with(
                        sqlx::sqlite::SqliteConnectOptions::new()
                            .filename(&cfg.path)
                            .create_if_missing(cfg.create_if_missing)
                            .foreign_keys(true)
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
        }
    }

    /// Run database migrations using sqlx's migration runner.
    /// A no-op for the memory backend.
    pub async fn run_migrations(&self) -> DbResult<()> {
        match &self.inner {
            PoolStorage::Memory(_) => Ok(()),
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                tracing::info!("Running SQLite migrations");
                sqlx::migrate!("./migrations_sqlx/sqlite").run(pool).await?;
                tracing::info!("SQLite migrations completed successfully");
                Ok(())
            }
        }
    }

    /// Write a seed file's records into the store.
    ///
    /// For the memory backend records are upserted by name, mirroring the
    /// SQLite import.
    pub async fn import_seed(&self, seed: &SeedFile) -> DbResult<()> {
        match &self.inner {
            PoolStorage::Memory(store) => {
                for authority in &seed.authorities {
                    store.upsert_authority(authority.clone());
                }
                for role in &seed.roles {
                    let grants: Vec<&str> = role.authorities.iter().map(String::as_str).collect();
                    store.upsert_role(&role.name, &grants)?;
                }
                for principal in &seed.principals {
                    let roles: Option<Vec<&str>> = principal
                        .roles
                        .as_ref()
                        .map(|names| names.iter().map(String::as_str).collect());
                    store.insert_principal(&principal.username, roles.as_deref())?;
                }
                Ok(())
            }
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => sqlite::import_seed(pool, seed).await.map(|_| ()),
        }
    }

    /// Name of the backend, for logs and health output.
    pub fn backend(&self) -> &'static str {
        match &self.inner {
            PoolStorage::Memory(_) => "memory",
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(_) => "sqlite",
        }
    }

    /// Get principal (identity store) repository
    pub fn principals(&self) -> Arc<dyn PrincipalRepo> {
        Arc::clone(&self.repos.principals)
    }

    /// Get authority definition repository
    pub fn authorities(&self) -> Arc<dyn AuthorityRepo> {
        Arc::clone(&self.repos.authorities)
    }

    /// Health check for store connectivity
    pub async fn health_check(&self) -> DbResult<()> {
        match &self.inner {
            PoolStorage::Memory(_) => Ok(()),
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
        }
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        match &self.inner {
            PoolStorage::Memory(_) => {}
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => pool.close().await,
        }
    }
}
