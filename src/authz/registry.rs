//! Resource authority registry.
//!
//! Maps URL path patterns to the authority names required to access them.
//! The mapping is read from the authority definition store in a single load
//! and cached as an immutable [`RuleSet`] until [`ResourceAuthorityRegistry::invalidate`]
//! starts a new load cycle.
//!
//! # Load cycle
//!
//! The registry is a small state machine guarded by a mutex:
//!
//! ```text
//! Unloaded --first caller--> Loading(shared future) --ok--> Loaded(snapshot)
//!     ^                              |
//!     +------------- error ----------+
//! ```
//!
//! Only the caller that finds the registry `Unloaded` starts a load. Every
//! caller arriving while it runs awaits the same shared future, so exactly one
//! store read happens per cycle and all of them observe the same outcome,
//! including a failure. Each cycle carries an attempt number; a load that
//! finishes after `invalidate()` was called never publishes its result.
//!
//! Readers hold an `Arc<RuleSet>`, so a reload swaps the whole snapshot at
//! once. A reader sees either the old rule set or the new one.
//!
//! # Collisions
//!
//! When two authority records share a `url`, the record processed later (in
//! store order) replaces the earlier one. Each replacement is logged as a
//! configuration warning and kept in [`RuleSet::collisions`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use super::{
    AuthoritySet,
    pattern::{PathPattern, canonicalize},
};
use crate::{
    db::{DbError, repos::AuthorityRepo},
    models::Authority,
};

/// Errors that can occur while loading the registry.
///
/// Cloneable so one failed load can be handed to every waiting caller.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("Failed to load resource rules: {0}")]
    Load(String),

    #[error("Invalid resource pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl From<DbError> for RegistryError {
    fn from(e: DbError) -> Self {
        RegistryError::Load(e.to_string())
    }
}

/// A loaded pattern-to-required-authority mapping entry.
#[derive(Debug, Clone)]
pub struct ResourceRule {
    pattern: PathPattern,
    required: AuthoritySet,
}

impl ResourceRule {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn required(&self) -> &AuthoritySet {
        &self.required
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches(path)
    }
}

/// Two authority records bound to the same pattern. The later one won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternCollision {
    pub pattern: String,
    pub overwritten: String,
    pub winner: String,
}

/// The pattern matched for a path and the authorities it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub pattern: String,
    pub required: AuthoritySet,
}

/// An immutable snapshot of resource rules, ordered by pattern precedence.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<ResourceRule>,
    collisions: Vec<PatternCollision>,
    loaded_at: DateTime<Utc>,
}

impl RuleSet {
    /// Build a rule set from authority records in store order.
    ///
    /// Records with a blank name or a blank url are skipped. One rule is kept
    /// per distinct pattern, holding the name of the last record bound to it.
    /// Without case sensitivity, patterns differing only in case are the
    /// same pattern. A pattern that fails to compile fails the whole build.
    pub fn build(authorities: &[Authority], case_sensitive: bool) -> Result<Self, RegistryError> {
        // (collision key, pattern, authority name)
        let mut entries: Vec<(String, String, String)> = Vec::new();
        let mut collisions = Vec::new();

        for authority in authorities {
            let Some(name) = authority.trimmed_name() else {
                tracing::warn!(url = %authority.url, "Skipping authority with blank name");
                continue;
            };
            if authority.url.trim().is_empty() {
                tracing::warn!(authority = %name, "Skipping authority with blank url");
                continue;
            }

            let pattern = canonicalize(&authority.url);
            let key = if case_sensitive {
                pattern.clone()
            } else {
                pattern.to_lowercase()
            };
            match entries.iter_mut().find(|(existing, _, _)| *existing == key) {
                Some((_, current, owner)) => {
                    *current = pattern.clone();
                    tracing::warn!(
                        pattern = %pattern,
                        overwritten = %owner,
                        winner = %name,
                        "Authority pattern collision, keeping the later definition"
                    );
                    collisions.push(PatternCollision {
                        pattern,
                        overwritten: std::mem::replace(owner, name.to_string()),
                        winner: name.to_string(),
                    });
                }
                None => entries.push((key, pattern, name.to_string())),
            }
        }

        let mut rules = entries
            .into_iter()
            .map(|(_, pattern, name)| {
                Ok(ResourceRule {
                    pattern: PathPattern::compile(&pattern, case_sensitive)?,
                    required: [name].into_iter().collect(),
                })
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;
        rules.sort_by(|a, b| a.pattern.precedence(&b.pattern));

        Ok(Self {
            rules,
            collisions,
            loaded_at: Utc::now(),
        })
    }

    /// The first rule, in precedence order, whose pattern matches `path`.
    pub fn find(&self, path: &str) -> Option<&ResourceRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub fn rules(&self) -> &[ResourceRule] {
        &self.rules
    }

    pub fn collisions(&self) -> &[PatternCollision] {
        &self.collisions
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

type LoadFuture = Shared<BoxFuture<'static, Result<Arc<RuleSet>, RegistryError>>>;

enum RegistryState {
    Unloaded,
    Loading(LoadFuture),
    Loaded(Arc<RuleSet>),
}

struct Inner {
    /// Incremented on every new load and on every invalidation
    attempt: u64,
    state: RegistryState,
}

/// Point-in-time view of the registry for health and admin output.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStatus {
    pub loaded: bool,
    pub loading: bool,
    pub rule_count: Option<usize>,
    pub collision_count: Option<usize>,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Lazily loaded, explicitly invalidated cache of resource rules.
pub struct ResourceAuthorityRegistry {
    store: Arc<dyn AuthorityRepo>,
    case_sensitive: bool,
    inner: Mutex<Inner>,
}

impl ResourceAuthorityRegistry {
    pub fn new(store: Arc<dyn AuthorityRepo>, case_sensitive: bool) -> Self {
        Self {
            store,
            case_sensitive,
            inner: Mutex::new(Inner {
                attempt: 0,
                state: RegistryState::Unloaded,
            }),
        }
    }

    /// The current rule set, loading it first if needed.
    ///
    /// Concurrent callers during a load share that load and its outcome.
    pub async fn rules(&self) -> Result<Arc<RuleSet>, RegistryError> {
        let (attempt, load) = {
            let mut inner = self.inner.lock();
            match &inner.state {
                RegistryState::Loaded(rules) => return Ok(Arc::clone(rules)),
                RegistryState::Loading(load) => (inner.attempt, load.clone()),
                RegistryState::Unloaded => {
                    inner.attempt += 1;
                    let load = Self::load(
                        Arc::clone(&self.store),
                        self.case_sensitive,
                        inner.attempt,
                    )
                    .boxed()
                    .shared();
                    inner.state = RegistryState::Loading(load.clone());
                    (inner.attempt, load)
                }
            }
        };

        let result = load.await;

        let mut inner = self.inner.lock();
        if inner.attempt == attempt && matches!(inner.state, RegistryState::Loading(_)) {
            inner.state = match &result {
                Ok(rules) => RegistryState::Loaded(Arc::clone(rules)),
                Err(_) => RegistryState::Unloaded,
            };
        }
        result
    }

    /// Required authorities for a normalized path, or `None` when no
    /// pattern matches.
    pub async fn resolve(&self, path: &str) -> Result<Option<AuthoritySet>, RegistryError> {
        Ok(self.resolve_match(path).await?.map(|m| m.required))
    }

    /// Like [`resolve`](Self::resolve), also naming the pattern that matched.
    pub async fn resolve_match(&self, path: &str) -> Result<Option<RuleMatch>, RegistryError> {
        let rules = self.rules().await?;
        Ok(rules.find(path).map(|rule| RuleMatch {
            pattern: rule.pattern().to_string(),
            required: rule.required().clone(),
        }))
    }

    /// Discard the current rule set. The next lookup starts a new load.
    ///
    /// A load already in flight finishes for its own waiters but is not
    /// published.
    pub fn invalidate(&self) {
        let mut inner = self.inner.lock();
        inner.attempt += 1;
        inner.state = RegistryState::Unloaded;
        tracing::info!(attempt = inner.attempt, "Resource rules invalidated");
    }

    /// Invalidate and load a fresh rule set.
    pub async fn reload(&self) -> Result<Arc<RuleSet>, RegistryError> {
        self.invalidate();
        self.rules().await
    }

    /// The loaded rule set, without triggering a load.
    pub fn snapshot(&self) -> Option<Arc<RuleSet>> {
        match &self.inner.lock().state {
            RegistryState::Loaded(rules) => Some(Arc::clone(rules)),
            _ => None,
        }
    }

    pub fn status(&self) -> RegistryStatus {
        let inner = self.inner.lock();
        match &inner.state {
            RegistryState::Loaded(rules) => RegistryStatus {
                loaded: true,
                loading: false,
                rule_count: Some(rules.len()),
                collision_count: Some(rules.collisions().len()),
                loaded_at: Some(rules.loaded_at()),
            },
            state => RegistryStatus {
                loaded: false,
                loading: matches!(state, RegistryState::Loading(_)),
                rule_count: None,
                collision_count: None,
                loaded_at: None,
            },
        }
    }

    async fn load(
        store: Arc<dyn AuthorityRepo>,
        case_sensitive: bool,
        attempt: u64,
    ) -> Result<Arc<RuleSet>, RegistryError> {
        tracing::debug!(attempt, "Loading resource rules");

        let result = async {
            let authorities = store.list_all().await?;
            RuleSet::build(&authorities, case_sensitive)
        }
        .await;

        match result {
            Ok(rules) => {
                tracing::info!(
                    attempt,
                    rules = rules.len(),
                    collisions = rules.collisions().len(),
                    "Loaded resource rules"
                );
                Ok(Arc::new(rules))
            }
            Err(e) => {
                tracing::error!(attempt, error = %e, "Failed to load resource rules");
                Err(e)
            }
        }
    }
}
