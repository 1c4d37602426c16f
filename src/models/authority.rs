use serde::{Deserialize, Serialize};

/// An atomic permission bound to a URL path pattern.
///
/// Names are meant to be unique identifiers, but nothing stops two records
/// from sharing the same `url`. The resource registry resolves that case
/// with a last-write-wins policy during its load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    /// Authority name, compared after trimming surrounding whitespace
    pub name: String,
    /// Path pattern the authority protects (e.g. `/admin/**`)
    pub url: String,
}

impl Authority {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// The trimmed authority name, or `None` if it is blank.
    pub fn trimmed_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }
}
