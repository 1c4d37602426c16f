//! In-memory identity and permission store.
//!
//! Backs both repository traits from a single lock-protected snapshot of
//! records. Role grants and principal assignments are stored by name and
//! joined on read, the same way the SQLite backend joins its link tables.

use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{
    error::{DbError, DbResult},
    repos::{AuthorityRepo, PrincipalRepo},
    seed::{SeedFile, SeedPrincipal, SeedRole},
};
use crate::models::{Authority, Principal, Role};

#[derive(Debug, Default)]
struct Records {
    authorities: Vec<Authority>,
    roles: Vec<SeedRole>,
    principals: Vec<SeedPrincipal>,
}

/// Store kept entirely in process memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a validated seed file.
    pub fn from_seed(seed: SeedFile) -> Self {
        Self {
            records: RwLock::new(Records {
                authorities: seed.authorities,
                roles: seed.roles,
                principals: seed.principals,
            }),
        }
    }

    /// Load a seed file from disk and build a store from it.
    pub fn from_seed_file(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_seed(SeedFile::from_file(path)?))
    }

    /// Insert an authority or replace the one with the same name.
    ///
    /// A replaced record keeps its position in store order.
    pub fn upsert_authority(&self, authority: Authority) {
        let mut records = self.records.write();
        match records
            .authorities
            .iter_mut()
            .find(|a| a.name == authority.name)
        {
            Some(existing) => *existing = authority,
            None => records.authorities.push(authority),
        }
    }

    /// Remove an authority and every role grant referencing it.
    ///
    /// Returns `false` if no authority has that name.
    pub fn remove_authority(&self, name: &str) -> bool {
        let mut records = self.records.write();
        let before = records.authorities.len();
        records.authorities.retain(|a| a.name != name);
        if records.authorities.len() == before {
            return false;
        }
        for role in &mut records.roles {
            role.authorities.retain(|granted| granted != name);
        }
        true
    }

    /// Insert a role or replace the one with the same name.
    ///
    /// # Errors
    /// Returns `DbError::Validation` if the role grants an unknown authority.
    pub fn upsert_role(&self, name: &str, authorities: &[&str]) -> DbResult<()> {
        let mut records = self.records.write();
        if let Some(missing) = authorities
            .iter()
            .find(|granted| !records.authorities.iter().any(|a| a.name == **granted))
        {
            return Err(DbError::Validation(format!(
                "role '{name}' references unknown authority '{missing}'"
            )));
        }
        let role = SeedRole {
            name: name.to_string(),
            authorities: authorities.iter().map(|a| a.to_string()).collect(),
        };
        match records.roles.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = role,
            None => records.roles.push(role),
        }
        Ok(())
    }

    /// Insert a principal or replace the one with the same username.
    ///
    /// `roles: None` leaves the principal's role collection unset.
    ///
    /// # Errors
    /// Returns `DbError::Validation` if a referenced role does not exist.
    pub fn insert_principal(&self, username: &str, roles: Option<&[&str]>) -> DbResult<()> {
        let mut records = self.records.write();
        if let Some(missing) = roles
            .into_iter()
            .flatten()
            .find(|role| !records.roles.iter().any(|r| r.name == **role))
        {
            return Err(DbError::Validation(format!(
                "principal '{username}' references unknown role '{missing}'"
            )));
        }
        let principal = SeedPrincipal {
            username: username.to_string(),
            roles: roles.map(|names| names.iter().map(|r| r.to_string()).collect()),
        };
        match records
            .principals
            .iter_mut()
            .find(|p| p.username == username)
        {
            Some(existing) => *existing = principal,
            None => records.principals.push(principal),
        }
        Ok(())
    }
}

#[async_trait]
impl PrincipalRepo for MemoryStore {
    async fn find_by_username(&self, username: &str) -> DbResult<Option<Principal>> {
        let records = self.records.read();
        let Some(record) = records.principals.iter().find(|p| p.username == username) else {
            return Ok(None);
        };

        let roles = record.roles.as_ref().map(|names| {
            names
                .iter()
                .filter_map(|name| records.roles.iter().find(|r| &r.name == name))
                .map(|role| {
                    let authorities = role
                        .authorities
                        .iter()
                        .filter_map(|name| records.authorities.iter().find(|a| &a.name == name))
                        .cloned()
                        .collect();
                    Role::new(role.name.clone(), authorities)
                })
                .collect()
        });

        Ok(Some(Principal {
            username: record.username.clone(),
            roles,
        }))
    }
}

#[async_trait]
impl AuthorityRepo for MemoryStore {
    async fn list_all(&self) -> DbResult<Vec<Authority>> {
        Ok(self.records.read().authorities.clone())
    }

    async fn create(&self, authority: Authority) -> DbResult<Authority> {
        let mut records = self.records.write();
        if records.authorities.iter().any(|a| a.name == authority.name) {
            return Err(DbError::Conflict(format!(
                "Authority '{}' already exists",
                authority.name
            )));
        }
        records.authorities.push(authority.clone());
        Ok(authority)
    }

    async fn delete_by_name(&self, name: &str) -> DbResult<()> {
        if self.remove_authority(name) {
            Ok(())
        } else {
            Err(DbError::NotFound)
        }
    }
}
