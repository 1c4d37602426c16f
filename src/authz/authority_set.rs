use std::{collections::BTreeSet, fmt};

use serde::Serialize;

/// A set of authority names.
///
/// Names are trimmed on insertion and blank names are dropped, so membership
/// tests always compare trimmed exact strings. Iteration order is sorted,
/// which keeps log output and API responses stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AuthoritySet(BTreeSet<String>);

impl AuthoritySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name. Returns `false` if it was blank or already present.
    pub fn insert(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.0.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name.trim())
    }

    /// Whether the two sets share at least one authority name.
    pub fn intersects(&self, other: &AuthoritySet) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.0.iter().any(|name| large.0.contains(name))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for AuthoritySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = AuthoritySet::new();
        for name in iter {
            set.insert(name.as_ref());
        }
        set
    }
}

impl<S: AsRef<str>> Extend<S> for AuthoritySet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for name in iter {
            self.insert(name.as_ref());
        }
    }
}

impl fmt::Display for AuthoritySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_drops_blank_names() {
        let set: AuthoritySet = ["  ROLE_ADMIN ", "", "   ", "ROLE_ADMIN", "ROLE_USER"]
            .into_iter()
            .collect();

        assert_eq!(set.len(), 2);
        assert!(set.contains("ROLE_ADMIN"));
        assert!(set.contains(" ROLE_USER "));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["ROLE_ADMIN", "ROLE_USER"]);
    }

    #[test]
    fn test_intersects() {
        let granted: AuthoritySet = ["ROLE_A", "ROLE_B"].into_iter().collect();
        let required: AuthoritySet = ["ROLE_B", "ROLE_C"].into_iter().collect();
        let other: AuthoritySet = ["ROLE_C"].into_iter().collect();

        assert!(granted.intersects(&required));
        assert!(required.intersects(&granted));
        assert!(!granted.intersects(&other));
        assert!(!granted.intersects(&AuthoritySet::new()));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let set: AuthoritySet = ["ROLE_ADMIN"].into_iter().collect();
        assert!(!set.contains("role_admin"));
    }

    #[test]
    fn test_display() {
        let set: AuthoritySet = ["ROLE_B", "ROLE_A"].into_iter().collect();
        assert_eq!(set.to_string(), "{ROLE_A, ROLE_B}");
        assert_eq!(AuthoritySet::new().to_string(), "{}");
    }
}
