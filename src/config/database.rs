use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Identity and permission store configuration.
///
/// Holds principals, roles and authority definitions. Authorization reads the
/// store through the repository traits; which backend serves them is decided
/// here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum DatabaseConfig {
    /// In-process store, optionally populated from a seed file.
    Memory(MemoryConfig),

    /// SQLite database. Good for single-node deployments.
    #[cfg(feature = "database-sqlite")]
    Sqlite(SqliteConfig),
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::Memory(MemoryConfig::default())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            DatabaseConfig::Memory(_) => Ok(()),
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(c) => c.validate(),
        }
    }

    /// Seed file to load at startup, if any.
    pub fn seed_file(&self) -> Option<&PathBuf> {
        match self {
            DatabaseConfig::Memory(c) => c.seed_file.as_ref(),
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(c) => c.seed_file.as_ref(),
        }
    }
}

/// In-memory store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// TOML seed file with authorities, roles and principals.
    /// The store starts empty when omitted.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

/// SQLite configuration.
#[cfg(feature = "database-sqlite")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteConfig {
    /// Path to the SQLite database file.
    /// Use `:memory:` for an in-memory database (testing only).
    pub path: String,

    /// Create the database file if it doesn't exist.
    #[serde(default = "default_true")]
    pub create_if_missing: bool,

    /// Run migrations on startup.
    #[serde(default = "default_true")]
    pub run_migrations: bool,

    /// Enable WAL mode for better concurrency.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_sqlite_max_connections")]
    pub max_connections: u32,

    /// Seed file imported after migrations on startup.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

#[cfg(feature = "database-sqlite")]
impl SqliteConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.path.is_empty() {
            return Err(ConfigError::Validation(
                "SQLite path cannot be empty".into(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Validation(
                "SQLite max_connections must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "database-sqlite")]
fn default_true() -> bool {
    true
}

#[cfg(feature = "database-sqlite")]
fn default_busy_timeout() -> u64 {
    5000 // 5 seconds
}

#[cfg(feature = "database-sqlite")]
fn default_sqlite_max_connections() -> u32 {
    5
}
