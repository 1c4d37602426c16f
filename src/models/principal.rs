use serde::{Deserialize, Serialize};

use super::Role;

/// An identity known to the identity store.
///
/// `roles` is `None` when the role collection was never assigned. That is a
/// different state from `Some(vec![])`: the first is rejected during
/// authority resolution, the second resolves to an empty authority set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    pub roles: Option<Vec<Role>>,
}

impl Principal {
    /// A principal whose role collection is assigned.
    pub fn with_roles(username: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            username: username.into(),
            roles: Some(roles),
        }
    }

    /// A principal whose role collection was never assigned.
    pub fn without_roles(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            roles: None,
        }
    }
}
