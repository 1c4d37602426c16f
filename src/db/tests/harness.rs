//! Test harness for store repository testing
//!
//! Provides utilities for setting up test stores:
//! - Memory: empty in-process store
//! - SQLite: Fast in-memory databases with real migrations

use std::sync::Arc;

use crate::db::{DbPool, MemoryStore, SeedFile};

/// Create an in-memory SQLite pool for testing
#[cfg(feature = "database-sqlite")]
pub async fn create_sqlite_pool() -> sqlx::SqlitePool {
    sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool")
}

/// Run SQLite migrations on the pool
///
/// Uses the actual migration files to ensure tests match production schema
#[cfg(feature = "database-sqlite")]
pub async fn run_sqlite_migrations(pool: &sqlx::SqlitePool) {
    sqlx::migrate!("./migrations_sqlx/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}

/// Create an empty memory-backed store
pub fn create_memory_db() -> DbPool {
    DbPool::from_memory(Arc::new(MemoryStore::new()))
}

/// Create a migrated SQLite-backed store
#[cfg(feature = "database-sqlite")]
pub async fn create_sqlite_db() -> DbPool {
    let pool = create_sqlite_pool().await;
    run_sqlite_migrations(&pool).await;
    DbPool::from_sqlite(pool)
}

/// Seed fixture shared by the repository tests
pub const FIXTURE: &str = r#"
[[authorities]]
name = "ROLE_ADMIN"
url = "/admin/**"

[[authorities]]
name = "ROLE_REPORTS"
url = "/reports/*"

[[authorities]]
name = "ROLE_UNUSED"
url = "/unused/**"

[[roles]]
name = "admin"
authorities = ["ROLE_ADMIN", "ROLE_REPORTS"]

[[roles]]
name = "viewer"
authorities = ["ROLE_REPORTS"]

[[roles]]
name = "empty"

[[principals]]
username = "alice"
roles = ["admin", "viewer"]

[[principals]]
username = "bob"
roles = ["empty"]

[[principals]]
username = "carol"
roles = []

[[principals]]
username = "nobody"
"#;

/// Import [`FIXTURE`] into a store
pub async fn seed_fixture(db: &DbPool) {
    let seed = SeedFile::from_str(FIXTURE).expect("fixture should parse");
    db.import_seed(&seed).await.expect("Failed to import fixture");
}
