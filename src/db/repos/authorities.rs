use async_trait::async_trait;

use crate::{db::error::DbResult, models::Authority};

/// Repository for authority definitions.
///
/// The resource registry reads this store once per load cycle via
/// [`AuthorityRepo::list_all`]. Writes made here are not visible to
/// authorization decisions until the registry is invalidated.
#[async_trait]
pub trait AuthorityRepo: Send + Sync {
    /// List every authority definition in store order.
    ///
    /// Store order is the processing order for the registry's collision
    /// policy: when two records share a `url`, the later one wins.
    async fn list_all(&self) -> DbResult<Vec<Authority>>;

    /// Create an authority definition.
    ///
    /// # Errors
    /// Returns `DbError::Conflict` if an authority with the same name exists.
    async fn create(&self, authority: Authority) -> DbResult<Authority>;

    /// Delete an authority definition by name.
    ///
    /// Role grants referencing the authority are removed with it.
    ///
    /// # Errors
    /// Returns `DbError::NotFound` if no authority has that name.
    async fn delete_by_name(&self, name: &str) -> DbResult<()>;
}
