use async_trait::async_trait;

use crate::{db::error::DbResult, models::Principal};

/// Read access to the identity store.
///
/// Implementations return principals with their role collection fully
/// populated (each role carrying its authorities). A principal whose role
/// collection was never assigned must come back with `roles: None`, not an
/// empty vector.
#[async_trait]
pub trait PrincipalRepo: Send + Sync {
    /// Find a principal by username.
    async fn find_by_username(&self, username: &str) -> DbResult<Option<Principal>>;
}
