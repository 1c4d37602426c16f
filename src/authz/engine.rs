//! Access decision engine.
//!
//! [`decide`] is a pure function of the caller's granted authorities and the
//! resource's required authorities. It performs no I/O and keeps no state.

use std::fmt;

use serde::Serialize;

use super::AuthoritySet;

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// None of the granted authorities satisfies the requirement
    InsufficientAuthority,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::InsufficientAuthority => write!(f, "insufficient authority"),
        }
    }
}

/// Authorization verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    Permit,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_permit(&self) -> bool {
        matches!(self, Decision::Permit)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Permit => write!(f, "permit"),
            Decision::Deny(reason) => write!(f, "deny ({reason})"),
        }
    }
}

/// Permit when nothing is required or when any granted authority is required.
pub fn decide(granted: &AuthoritySet, required: Option<&AuthoritySet>) -> Decision {
    match required {
        None => Decision::Permit,
        Some(required) if required.is_empty() => Decision::Permit,
        Some(required) if granted.intersects(required) => Decision::Permit,
        Some(_) => Decision::Deny(DenyReason::InsufficientAuthority),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn set(names: &[&str]) -> AuthoritySet {
        names.iter().collect()
    }

    #[rstest]
    #[case(&[], None, true)]
    #[case(&["ROLE_A"], None, true)]
    #[case(&[], Some(&[][..]), true)]
    #[case(&["ROLE_A"], Some(&[][..]), true)]
    #[case(&["ROLE_A"], Some(&["ROLE_A"][..]), true)]
    #[case(&["ROLE_A", "ROLE_B"], Some(&["ROLE_B", "ROLE_C"][..]), true)]
    #[case(&[" ROLE_A "], Some(&["ROLE_A"][..]), true)]
    #[case(&[], Some(&["ROLE_A"][..]), false)]
    #[case(&["ROLE_B"], Some(&["ROLE_A"][..]), false)]
    #[case(&["role_a"], Some(&["ROLE_A"][..]), false)]
    fn test_decide(
        #[case] granted: &[&str],
        #[case] required: Option<&[&str]>,
        #[case] permit: bool,
    ) {
        let granted = set(granted);
        let required = required.map(set);
        let decision = decide(&granted, required.as_ref());

        if permit {
            assert_eq!(decision, Decision::Permit);
        } else {
            assert_eq!(decision, Decision::Deny(DenyReason::InsufficientAuthority));
        }
    }

    #[test]
    fn test_deny_reason_text() {
        let decision = Decision::Deny(DenyReason::InsufficientAuthority);
        assert_eq!(decision.to_string(), "deny (insufficient authority)");
        assert!(!decision.is_permit());
    }

    #[test]
    fn test_decision_serialization() {
        assert_eq!(
            serde_json::to_value(Decision::Permit).unwrap(),
            serde_json::json!({"decision": "permit"})
        );
        assert_eq!(
            serde_json::to_value(Decision::Deny(DenyReason::InsufficientAuthority)).unwrap(),
            serde_json::json!({"decision": "deny", "reason": "insufficient_authority"})
        );
    }
}
