//! pathgate: data-driven URL authorization.
//!
//! Resource rules bind URL path patterns to required authorities and live in
//! a mutable store next to the principals and roles they are checked against.
//! The [`authz`] module holds the decision core; the rest of the crate wires
//! it into an axum service with a forward-auth endpoint and admin routes.

use std::sync::Arc;

use axum::Router;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

pub mod authz;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
#[cfg(feature = "server")]
pub mod observability;
pub mod routes;

#[cfg(test)]
mod tests;

/// Shared application state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::PathgateConfig>,
    pub db: Arc<db::DbPool>,
    pub authorizer: Arc<authz::Authorizer>,
}

impl AppState {
    /// Build state over an opened store.
    pub fn new(config: config::PathgateConfig, db: db::DbPool) -> Self {
        let authorizer = authz::Authorizer::from_db(&db, &config.auth.authz);
        Self {
            config: Arc::new(config),
            db: Arc::new(db),
            authorizer: Arc::new(authorizer),
        }
    }
}

/// Assemble the HTTP application.
pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    Router::new()
        .merge(routes::public_routes())
        .merge(routes::admin_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}
