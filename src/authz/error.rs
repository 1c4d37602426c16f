//! Authorization errors.

use thiserror::Error;

use super::{DenyReason, RegistryError};
use crate::db::DbError;

/// Faults and denials surfaced by [`Authorizer`](super::Authorizer).
///
/// `PrincipalNotFound` and `NoRolesAssigned` are identity faults, distinct
/// from `AccessDenied`: the first two mean the caller could not be resolved
/// to a granted-authority set at all.
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("Principal not found: {0}")]
    PrincipalNotFound(String),

    #[error("Principal '{0}' has no roles assigned")]
    NoRolesAssigned(String),

    #[error("Access denied: {0}")]
    AccessDenied(DenyReason),

    #[error("Invalid request path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Identity store error: {0}")]
    Store(#[from] DbError),
}

impl AuthzError {
    /// Whether this error is about the caller's identity rather than the
    /// resource or the system.
    pub fn is_identity_fault(&self) -> bool {
        matches!(
            self,
            AuthzError::PrincipalNotFound(_) | AuthzError::NoRolesAssigned(_)
        )
    }

    /// Whether this error comes from the store or registry being unavailable.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AuthzError::Registry(_) | AuthzError::Store(_))
    }
}
