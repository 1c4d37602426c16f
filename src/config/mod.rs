//! Configuration module for pathgate.
//!
//! The service is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! type = "sqlite"
//! path = "${PATHGATE_DATA_DIR}/pathgate.db"
//!
//! [auth]
//! identity_header = "x-authenticated-user"
//! ```

mod auth;
mod database;
mod observability;
mod server;

use std::path::Path;

pub use auth::*;
pub use database::*;
pub use observability::*;
use serde::{Deserialize, Serialize};
pub use server::*;

/// Root configuration for pathgate.
///
/// All sections are optional with sensible defaults. An empty file runs an
/// empty in-memory store with enforcement on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathgateConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Identity and permission store.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Authentication and authorization configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Observability configuration (logging).
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl PathgateConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        // Expand environment variables
        let expanded = expand_env_vars(contents)?;

        // Pre-check: detect feature-gated config values before typed deserialization
        // to provide helpful error messages instead of cryptic serde "unknown variant" errors
        let raw: toml::Value = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        check_disabled_features(&raw)?;

        let config: PathgateConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;

        if !self.server.host.is_loopback() {
            tracing::warn!(
                header = %self.auth.identity_header,
                "Server binds to a non-localhost address. The identity header is trusted \
                 as-is, so only expose this service behind a proxy that sets it."
            );
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Reject config values that need a feature this build was compiled without.
fn check_disabled_features(raw: &toml::Value) -> Result<(), ConfigError> {
    let mut issues: Vec<(String, &str)> = Vec::new();

    if let Some(type_val) = raw
        .get("database")
        .and_then(|v| v.get("type"))
        .and_then(|v| v.as_str())
    {
        check_database_feature(type_val, &mut issues);
    }

    if issues.is_empty() {
        return Ok(());
    }

    let details = issues
        .iter()
        .map(|(msg, _)| msg.as_str())
        .collect::<Vec<_>>()
        .join("\n  - ");
    let features = issues
        .iter()
        .map(|(_, feat)| *feat)
        .collect::<Vec<_>>()
        .join(",");

    Err(ConfigError::Validation(format!(
        "Configuration requires features not compiled in this build:\n  \
         - {details}\n\n\
         Rebuild with: cargo build --features {features}\n\
         Or use the 'full' profile: cargo build --features full"
    )))
}

fn check_database_feature(type_val: &str, _issues: &mut Vec<(String, &str)>) {
    match type_val {
        #[cfg(not(feature = "database-sqlite"))]
        "sqlite" => _issues.push((
            "database type 'sqlite' requires the 'database-sqlite' feature".into(),
            "database-sqlite",
        )),
        _ => {}
    }
}

/// Expand `${VAR}` references, leaving anything after a `#` untouched.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ConfigError::Validation(e.to_string()))?;
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');

        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let Some(whole) = cap.get(0) else {
                continue;
            };

            if let Some(pos) = comment_pos
                && whole.start() >= pos
            {
                continue;
            }

            line_result.push_str(&line[last_end..whole.start()]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            line_result.push_str(&value);

            last_end = whole.end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}
