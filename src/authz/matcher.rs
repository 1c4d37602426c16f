use std::sync::Arc;

use super::{AuthoritySet, AuthzError, ResourceAuthorityRegistry, RuleMatch};

/// Normalizes request paths and looks them up in the registry.
#[derive(Clone)]
pub struct RequestResourceMatcher {
    registry: Arc<ResourceAuthorityRegistry>,
}

impl RequestResourceMatcher {
    pub fn new(registry: Arc<ResourceAuthorityRegistry>) -> Self {
        Self { registry }
    }

    /// Required authorities for a raw request target, or `None` if the path
    /// is unprotected.
    pub async fn required_authorities(
        &self,
        request_path: &str,
    ) -> Result<Option<AuthoritySet>, AuthzError> {
        Ok(self.match_path(request_path).await?.1.map(|m| m.required))
    }

    /// Normalized path and the rule it matched.
    pub async fn match_path(
        &self,
        request_path: &str,
    ) -> Result<(String, Option<RuleMatch>), AuthzError> {
        let path = normalize_path(request_path)?;
        let matched = self.registry.resolve_match(&path).await?;
        Ok((path, matched))
    }
}

/// Reduce a request target to the canonical path used for pattern matching.
///
/// Drops any query string and fragment, percent-decodes, ensures a leading
/// `/`, collapses repeated slashes, resolves `.` and `..` (never above the
/// root) and removes a trailing slash except on the root itself.
///
/// # Errors
/// `InvalidPath` if percent-decoding does not produce UTF-8.
pub fn normalize_path(request_path: &str) -> Result<String, AuthzError> {
    let end = request_path.find(['?', '#']).unwrap_or(request_path.len());
    let raw = &request_path[..end];

    let decoded = urlencoding::decode(raw)
        .map_err(|_| AuthzError::InvalidPath(request_path.to_string()))?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    Ok(format!("/{}", segments.join("/")))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{db::MemoryStore, models::Authority};

    #[rstest]
    #[case("/admin/users", "/admin/users")]
    #[case("/admin/users/", "/admin/users")]
    #[case("/admin/users?page=2", "/admin/users")]
    #[case("/admin/users#top", "/admin/users")]
    #[case("/admin/users/?q=a#b", "/admin/users")]
    #[case("admin/users", "/admin/users")]
    #[case("//admin///users", "/admin/users")]
    #[case("/admin/./users", "/admin/users")]
    #[case("/public/../admin/users", "/admin/users")]
    #[case("/../../admin", "/admin")]
    #[case("/%61dmin/users", "/admin/users")]
    #[case("/public/%2e%2e/admin", "/admin")]
    #[case("/files/a%20b", "/files/a b")]
    #[case("", "/")]
    #[case("/", "/")]
    #[case("?x=1", "/")]
    #[case("/..", "/")]
    fn test_normalize_path(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_path(input).unwrap(), expected);
    }

    #[test]
    fn test_normalize_rejects_invalid_utf8() {
        let err = normalize_path("/admin/%ff").unwrap_err();
        assert!(matches!(err, AuthzError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_matcher_normalizes_before_lookup() {
        let store = MemoryStore::new();
        store.upsert_authority(Authority::new("ROLE_ADMIN", "/admin/**"));
        let registry = Arc::new(ResourceAuthorityRegistry::new(Arc::new(store), true));
        let matcher = RequestResourceMatcher::new(registry);

        let required = matcher
            .required_authorities("/public/../admin/users/?tab=1")
            .await
            .unwrap()
            .unwrap();
        assert!(required.contains("ROLE_ADMIN"));

        let (path, matched) = matcher.match_path("/admin/").await.unwrap();
        assert_eq!(path, "/admin");
        assert_eq!(matched.unwrap().pattern, "/admin/**");

        assert!(matcher.required_authorities("/public/info").await.unwrap().is_none());
    }
}
