//! Seed files for populating the identity and permission stores.
//!
//! A seed file is TOML with three arrays of tables:
//!
//! ```toml
//! [[authorities]]
//! name = "ROLE_ADMIN"
//! url = "/admin/**"
//!
//! [[roles]]
//! name = "admin"
//! authorities = ["ROLE_ADMIN"]
//!
//! [[principals]]
//! username = "alice"
//! roles = ["admin"]
//!
//! [[principals]]
//! username = "nobody"   # no `roles` key: role collection is unset
//! ```
//!
//! Omitting `roles` on a principal leaves its role collection unset, while
//! `roles = []` assigns an empty collection.

use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};

use super::error::{DbError, DbResult};
use crate::models::Authority;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub authorities: Vec<Authority>,
    #[serde(default)]
    pub roles: Vec<SeedRole>,
    #[serde(default)]
    pub principals: Vec<SeedPrincipal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedRole {
    pub name: String,
    /// Names of the authorities granted by this role.
    #[serde(default)]
    pub authorities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedPrincipal {
    pub username: String,
    /// Names of the roles assigned to this principal. `None` means unset.
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

impl SeedFile {
    /// Load and validate a seed file.
    pub fn from_file(path: impl AsRef<Path>) -> DbResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DbError::Io(e, path.as_ref().to_path_buf()))?;
        Self::from_str(&contents)
    }

    /// Parse and validate seed contents.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> DbResult<Self> {
        let seed: SeedFile = toml::from_str(contents)?;
        seed.validate()?;
        Ok(seed)
    }

    /// Check uniqueness of names and that every reference resolves.
    pub fn validate(&self) -> DbResult<()> {
        let mut authority_names = HashSet::new();
        let mut trimmed_names = HashSet::new();
        for authority in &self.authorities {
            authority_names.insert(authority.name.as_str());
            if !trimmed_names.insert(authority.name.trim()) {
                return Err(DbError::Validation(format!(
                    "duplicate authority name '{}'",
                    authority.name
                )));
            }
        }

        let mut role_names = HashSet::new();
        for role in &self.roles {
            if !role_names.insert(role.name.as_str()) {
                return Err(DbError::Validation(format!(
                    "duplicate role name '{}'",
                    role.name
                )));
            }
            if let Some(missing) = role
                .authorities
                .iter()
                .find(|name| !authority_names.contains(name.as_str()))
            {
                return Err(DbError::Validation(format!(
                    "role '{}' references unknown authority '{}'",
                    role.name, missing
                )));
            }
        }

        let mut usernames = HashSet::new();
        for principal in &self.principals {
            if !usernames.insert(principal.username.as_str()) {
                return Err(DbError::Validation(format!(
                    "duplicate principal '{}'",
                    principal.username
                )));
            }
            if let Some(missing) = principal
                .roles
                .iter()
                .flatten()
                .find(|name| !role_names.contains(name.as_str()))
            {
                return Err(DbError::Validation(format!(
                    "principal '{}' references unknown role '{}'",
                    principal.username, missing
                )));
            }
        }

        Ok(())
    }
}
