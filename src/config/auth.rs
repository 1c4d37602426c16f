use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Authentication and authorization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Header carrying the authenticated principal's username.
    ///
    /// Set by the reverse proxy or authentication layer in front of this
    /// service. Only trust it when the service is not directly reachable.
    #[serde(default = "default_identity_header")]
    pub identity_header: String,

    /// Authorize requests without an identity header using an empty granted
    /// set, so only unprotected paths are permitted. When false, such
    /// requests are rejected as unauthenticated.
    #[serde(default)]
    pub allow_anonymous: bool,

    /// Path authorization configuration.
    #[serde(default)]
    pub authz: AuthzConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identity_header: default_identity_header(),
            allow_anonymous: false,
            authz: AuthzConfig::default(),
        }
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity_header.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Identity header cannot be empty".into(),
            ));
        }
        if http::HeaderName::from_bytes(self.identity_header.as_bytes()).is_err() {
            return Err(ConfigError::Validation(format!(
                "Identity header '{}' is not a valid header name",
                self.identity_header
            )));
        }
        Ok(())
    }
}

fn default_identity_header() -> String {
    "x-authenticated-user".to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Path Authorization Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Data-driven path authorization.
///
/// Resource rules are loaded from the authority definition store; this only
/// controls how they are applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthzConfig {
    /// Whether authorization is enforced. If false, every request is permitted.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Match resource patterns case-sensitively.
    #[serde(default = "default_true")]
    pub case_sensitive: bool,

    /// Load resource rules at startup instead of on the first request.
    /// A load failure then aborts startup.
    #[serde(default)]
    pub preload: bool,

    /// Audit logging configuration for authorization decisions.
    #[serde(default)]
    pub audit: AuthzAuditConfig,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            case_sensitive: true,
            preload: false,
            audit: AuthzAuditConfig::default(),
        }
    }
}

/// Configuration for authorization decision audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthzAuditConfig {
    /// Log allowed authorization decisions.
    /// Defaults to false (only denied decisions are logged).
    #[serde(default)]
    pub log_allowed: bool,

    /// Log denied authorization decisions.
    /// Defaults to true for security monitoring.
    #[serde(default = "default_true")]
    pub log_denied: bool,
}

impl Default for AuthzAuditConfig {
    fn default() -> Self {
        Self {
            log_allowed: false,
            log_denied: true,
        }
    }
}

fn default_true() -> bool {
    true
}
