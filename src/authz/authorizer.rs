use std::sync::Arc;

use serde::Serialize;

use super::{
    AuthoritySet, AuthzError, Decision, PrincipalAuthorityResolver, RequestResourceMatcher,
    ResourceAuthorityRegistry, decide, normalize_path,
};
use crate::{
    config::{AuthzAuditConfig, AuthzConfig},
    db::{DbPool, repos::PrincipalRepo},
};

/// Log target for authorization decisions.
pub const AUDIT_TARGET: &str = "pathgate::audit";

/// Everything known about one authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationOutcome {
    #[serde(flatten)]
    pub decision: Decision,
    /// `None` for anonymous requests
    pub principal: Option<String>,
    /// Normalized request path
    pub path: String,
    pub matched_pattern: Option<String>,
    pub required: Option<AuthoritySet>,
    pub granted: AuthoritySet,
}

/// Single entry point for path authorization.
///
/// Resolves the caller's granted authorities, finds the rule for the request
/// path and renders a decision. Identity faults are checked before the
/// registry is consulted.
pub struct Authorizer {
    resolver: PrincipalAuthorityResolver,
    registry: Arc<ResourceAuthorityRegistry>,
    matcher: RequestResourceMatcher,
    enabled: bool,
    audit: AuthzAuditConfig,
}

impl Authorizer {
    pub fn new(
        identities: Arc<dyn PrincipalRepo>,
        registry: Arc<ResourceAuthorityRegistry>,
        config: &AuthzConfig,
    ) -> Self {
        Self {
            resolver: PrincipalAuthorityResolver::new(identities),
            matcher: RequestResourceMatcher::new(Arc::clone(&registry)),
            registry,
            enabled: config.enabled,
            audit: config.audit.clone(),
        }
    }

    /// Build an authorizer and its registry over a store.
    pub fn from_db(db: &DbPool, config: &AuthzConfig) -> Self {
        let registry = Arc::new(ResourceAuthorityRegistry::new(
            db.authorities(),
            config.case_sensitive,
        ));
        Self::new(db.principals(), registry, config)
    }

    pub fn registry(&self) -> &Arc<ResourceAuthorityRegistry> {
        &self.registry
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decide whether `principal` may access `request_path`.
    ///
    /// # Errors
    /// Identity faults (`PrincipalNotFound`, `NoRolesAssigned`), `InvalidPath`
    /// and registry or store failures. A denial is `Ok(Decision::Deny(_))`.
    pub async fn authorize(
        &self,
        principal: &str,
        request_path: &str,
    ) -> Result<Decision, AuthzError> {
        Ok(self.evaluate(Some(principal), request_path).await?.decision)
    }

    /// Like [`authorize`](Self::authorize), but turns a denial into
    /// `AuthzError::AccessDenied`.
    pub async fn require(
        &self,
        principal: Option<&str>,
        request_path: &str,
    ) -> Result<AuthorizationOutcome, AuthzError> {
        let outcome = self.evaluate(principal, request_path).await?;
        match outcome.decision {
            Decision::Permit => Ok(outcome),
            Decision::Deny(reason) => Err(AuthzError::AccessDenied(reason)),
        }
    }

    /// Full decision for a principal, or for an anonymous caller with no
    /// granted authorities when `principal` is `None`.
    pub async fn evaluate(
        &self,
        principal: Option<&str>,
        request_path: &str,
    ) -> Result<AuthorizationOutcome, AuthzError> {
        if !self.enabled {
            // Malformed targets are still permitted here, reported as sent.
            let path = normalize_path(request_path).unwrap_or_else(|_| request_path.to_string());
            return Ok(AuthorizationOutcome {
                decision: Decision::Permit,
                principal: principal.map(String::from),
                path,
                matched_pattern: None,
                required: None,
                granted: AuthoritySet::new(),
            });
        }

        let result = self.evaluate_enforced(principal, request_path).await;
        match &result {
            Ok(outcome) => self.log_decision(outcome),
            Err(e) => tracing::warn!(
                target: AUDIT_TARGET,
                principal = principal.unwrap_or("-"),
                path = %request_path,
                error = %e,
                "Authorization fault"
            ),
        }
        result
    }

    async fn evaluate_enforced(
        &self,
        principal: Option<&str>,
        request_path: &str,
    ) -> Result<AuthorizationOutcome, AuthzError> {
        let granted = match principal {
            Some(username) => self.resolver.resolve(username).await?,
            None => AuthoritySet::new(),
        };

        let (path, matched) = self.matcher.match_path(request_path).await?;
        let (matched_pattern, required) = match matched {
            Some(m) => (Some(m.pattern), Some(m.required)),
            None => (None, None),
        };

        Ok(AuthorizationOutcome {
            decision: decide(&granted, required.as_ref()),
            principal: principal.map(String::from),
            path,
            matched_pattern,
            required,
            granted,
        })
    }

    fn log_decision(&self, outcome: &AuthorizationOutcome) {
        let principal = outcome.principal.as_deref().unwrap_or("-");
        let pattern = outcome.matched_pattern.as_deref().unwrap_or("-");
        match outcome.decision {
            Decision::Permit if self.audit.log_allowed => tracing::info!(
                target: AUDIT_TARGET,
                principal,
                path = %outcome.path,
                pattern,
                decision = "permit",
                "Authorization decision"
            ),
            Decision::Deny(reason) if self.audit.log_denied => tracing::warn!(
                target: AUDIT_TARGET,
                principal,
                path = %outcome.path,
                pattern,
                required = %outcome.required.clone().unwrap_or_default(),
                granted = %outcome.granted,
                decision = "deny",
                reason = %reason,
                "Authorization decision"
            ),
            _ => {}
        }
    }
}
