//! Path authorization middleware.
//!
//! Runs every request through [`Authorizer::require`](crate::authz::Authorizer::require)
//! and maps the outcome onto an HTTP response:
//!
//! | Outcome                                         | Status |
//! |-------------------------------------------------|--------|
//! | Permit                                          | pass through |
//! | missing identity, unknown principal, no roles   | 401 |
//! | Deny                                            | 403 |
//! | malformed path                                  | 400 |
//! | registry or store unavailable                   | 503 |

use axum::{
    Json,
    extract::{OriginalUri, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::AuthenticatedPrincipal;
use crate::{
    AppState,
    authz::{AuthorizationOutcome, AuthzError, DenyReason},
    routes::ErrorResponse,
};

/// Authorize a caller for a request path under the configured anonymous policy.
///
/// Shared by [`authz_middleware`] and the forward-auth check endpoint.
pub async fn authorize_request(
    state: &AppState,
    principal: Option<&AuthenticatedPrincipal>,
    path: &str,
) -> Result<AuthorizationOutcome, AuthzResponse> {
    if principal.is_none() && !state.config.auth.allow_anonymous {
        tracing::debug!(path, "Rejecting request without identity");
        return Err(AuthzResponse::Unauthenticated);
    }

    Ok(state
        .authorizer
        .require(principal.map(AuthenticatedPrincipal::as_str), path)
        .await?)
}

/// Middleware that enforces path authorization.
///
/// Expects [`identity_middleware`](super::identity_middleware) to have run
/// first. The path is taken from the original request URI so routers nested
/// under a prefix are still matched against the full path. On success the
/// [`AuthorizationOutcome`] is attached to the request extensions.
pub async fn authz_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthzResponse> {
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let principal = req.extensions().get::<AuthenticatedPrincipal>().cloned();

    let outcome = authorize_request(&state, principal.as_ref(), &path).await?;
    req.extensions_mut().insert(outcome);

    Ok(next.run(req).await)
}

/// Response type for authorization failures.
#[derive(Debug)]
pub enum AuthzResponse {
    /// No identity and anonymous access is off
    Unauthenticated,
    UnknownPrincipal(String),
    NoRolesAssigned(String),
    Forbidden(DenyReason),
    InvalidPath(String),
    /// Resource rules or the identity store could not be read
    Unavailable,
}

impl From<AuthzError> for AuthzResponse {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::PrincipalNotFound(username) => AuthzResponse::UnknownPrincipal(username),
            AuthzError::NoRolesAssigned(username) => AuthzResponse::NoRolesAssigned(username),
            AuthzError::AccessDenied(reason) => AuthzResponse::Forbidden(reason),
            AuthzError::InvalidPath(path) => AuthzResponse::InvalidPath(path),
            AuthzError::Registry(_) | AuthzError::Store(_) => AuthzResponse::Unavailable,
        }
    }
}

impl IntoResponse for AuthzResponse {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "unauthenticated",
                "Authentication required".to_string(),
            ),
            Self::UnknownPrincipal(username) => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "principal_not_found",
                format!("Unknown principal '{username}'"),
            ),
            Self::NoRolesAssigned(username) => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "no_roles_assigned",
                format!("Principal '{username}' has no roles assigned"),
            ),
            Self::Forbidden(reason) => (
                StatusCode::FORBIDDEN,
                "permission_error",
                "access_denied",
                format!("Access denied: {reason}"),
            ),
            Self::InvalidPath(path) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "invalid_path",
                format!("Invalid request path: {path}"),
            ),
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "server_error",
                "authorization_unavailable",
                "Authorization is temporarily unavailable".to_string(),
            ),
        };

        (status, Json(ErrorResponse::new(error_type, code, message))).into_response()
    }
}
