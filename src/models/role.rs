use serde::{Deserialize, Serialize};

use super::Authority;

/// A named group of authorities assignable to a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub authorities: Vec<Authority>,
}

impl Role {
    pub fn new(name: impl Into<String>, authorities: Vec<Authority>) -> Self {
        Self {
            name: name.into(),
            authorities,
        }
    }
}
