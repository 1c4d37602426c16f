use std::sync::Arc;

use super::{AuthoritySet, AuthzError};
use crate::{db::repos::PrincipalRepo, models::Role};

/// Flattens a principal's roles into the set of authority names it holds.
pub struct PrincipalAuthorityResolver {
    identities: Arc<dyn PrincipalRepo>,
}

impl PrincipalAuthorityResolver {
    pub fn new(identities: Arc<dyn PrincipalRepo>) -> Self {
        Self { identities }
    }

    /// Granted authorities for `username`.
    ///
    /// # Errors
    /// - `PrincipalNotFound` if the identity store has no such principal
    /// - `NoRolesAssigned` if the principal's role collection is unset
    ///
    /// A principal with an assigned but empty role collection resolves to an
    /// empty set.
    pub async fn resolve(&self, username: &str) -> Result<AuthoritySet, AuthzError> {
        let principal = self
            .identities
            .find_by_username(username)
            .await?
            .ok_or_else(|| AuthzError::PrincipalNotFound(username.to_string()))?;

        let roles = principal
            .roles
            .ok_or_else(|| AuthzError::NoRolesAssigned(principal.username.clone()))?;

        Ok(flatten(&roles))
    }
}

/// Every authority name granted by `roles`, trimmed, blanks dropped.
pub fn flatten(roles: &[Role]) -> AuthoritySet {
    roles
        .iter()
        .flat_map(|role| role.authorities.iter())
        .map(|authority| authority.name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::MemoryStore, models::Authority};

    fn store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.upsert_authority(Authority::new("ROLE_ADMIN", "/admin/**"));
        store.upsert_authority(Authority::new(" ROLE_REPORTS ", "/reports/**"));
        store.upsert_authority(Authority::new("   ", "/ignored/**"));
        store
            .upsert_role("admin", &["ROLE_ADMIN", " ROLE_REPORTS ", "   "])
            .unwrap();
        store.upsert_role("viewer", &[" ROLE_REPORTS "]).unwrap();
        store.insert_principal("alice", Some(&["admin", "viewer"])).unwrap();
        store.insert_principal("carol", Some(&[])).unwrap();
        store.insert_principal("nobody", None).unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_flattens_roles() {
        let resolver = PrincipalAuthorityResolver::new(store());

        let granted = resolver.resolve("alice").await.unwrap();
        assert_eq!(
            granted.iter().collect::<Vec<_>>(),
            vec!["ROLE_ADMIN", "ROLE_REPORTS"]
        );
    }

    #[tokio::test]
    async fn test_unknown_principal() {
        let resolver = PrincipalAuthorityResolver::new(store());

        let err = resolver.resolve("mallory").await.unwrap_err();
        assert!(matches!(err, AuthzError::PrincipalNotFound(name) if name == "mallory"));
    }

    #[tokio::test]
    async fn test_unset_roles_differ_from_empty_roles() {
        let resolver = PrincipalAuthorityResolver::new(store());

        let err = resolver.resolve("nobody").await.unwrap_err();
        assert!(matches!(err, AuthzError::NoRolesAssigned(name) if name == "nobody"));

        let granted = resolver.resolve("carol").await.unwrap();
        assert!(granted.is_empty());
    }

    #[test]
    fn test_flatten_pure() {
        let roles = vec![
            Role::new("a", vec![Authority::new("ROLE_X", "/x"), Authority::new("", "/y")]),
            Role::new("b", vec![]),
            Role::new("c", vec![Authority::new("ROLE_X ", "/x")]),
        ];

        let set = flatten(&roles);
        assert_eq!(set.len(), 1);
        assert!(set.contains("ROLE_X"));
    }
}
