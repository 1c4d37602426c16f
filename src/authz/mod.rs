//! Data-driven URL authorization.
//!
//! Resource rules map path patterns to the authority names required to
//! access them. They are loaded from the authority definition store and
//! compared against the authorities a principal holds through its roles.
//!
//! The authorization flow:
//! 1. [`PrincipalAuthorityResolver`] flattens the principal's roles into an [`AuthoritySet`]
//! 2. [`RequestResourceMatcher`] normalizes the request path and asks the
//!    [`ResourceAuthorityRegistry`] for the first matching rule
//! 3. [`decide`] permits when nothing is required or any required authority is granted
//!
//! [`Authorizer`] runs the three steps and is what middleware calls.

mod authority_set;
mod authorizer;
mod engine;
mod error;
mod matcher;
mod pattern;
mod registry;
mod resolver;

pub use authority_set::AuthoritySet;
pub use authorizer::{AUDIT_TARGET, AuthorizationOutcome, Authorizer};
pub use engine::{Decision, DenyReason, decide};
pub use error::AuthzError;
pub use matcher::{RequestResourceMatcher, normalize_path};
pub use pattern::PathPattern;
pub use registry::{
    PatternCollision, RegistryError, RegistryStatus, ResourceAuthorityRegistry, ResourceRule,
    RuleMatch, RuleSet,
};
pub use resolver::{PrincipalAuthorityResolver, flatten};
