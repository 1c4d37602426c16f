//! HTTP routes.
//!
//! - `/health`, `/health/live`: unauthenticated health checks
//! - `/authz/check`: forward-auth decisions for a reverse proxy
//! - `/admin/...`: rule and authority management, behind path authorization

pub mod admin;
pub mod check;
mod error;
pub mod health;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
pub use error::{ApiError, ErrorInfo, ErrorResponse};

use crate::{
    AppState,
    middleware::{authz_middleware, identity_middleware},
};

/// Routes reachable without identity.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/authz/check", get(check::check))
}

/// Admin routes, guarded by the resource rules like any other path.
pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/authz/rules", get(admin::list_rules))
        .route("/admin/authz/reload", post(admin::reload_rules))
        .route("/admin/authorities", post(admin::create_authority))
        .route("/admin/authorities/{name}", delete(admin::delete_authority))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authz_middleware,
        ))
        .layer(middleware::from_fn_with_state(state, identity_middleware))
}
