//! Shared fixtures for router and middleware tests.

use std::sync::Arc;

pub use crate::db::tests::harness::FIXTURE;
use crate::{
    AppState,
    config::PathgateConfig,
    db::{DbPool, MemoryStore, SeedFile},
};

/// Application state over an in-memory store seeded from `seed`.
pub fn test_state_with(config: PathgateConfig, seed: &str) -> AppState {
    test_state_with_store(config, seed).1
}

/// Like [`test_state_with`], also returning the store for tests that mutate it.
pub fn test_state_with_store(config: PathgateConfig, seed: &str) -> (Arc<MemoryStore>, AppState) {
    let seed = SeedFile::from_str(seed).expect("seed should parse");
    let store = Arc::new(MemoryStore::from_seed(seed));
    let state = AppState::new(config, DbPool::from_memory(Arc::clone(&store)));
    (store, state)
}
