use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to read seed file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse seed file: {0}")]
    Seed(#[from] toml::de::Error),

    #[cfg(feature = "database-sqlite")]
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[cfg(feature = "database-sqlite")]
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type DbResult<T> = Result<T, DbError>;
