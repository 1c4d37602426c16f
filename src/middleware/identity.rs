use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::AppState;

/// Username of the caller, as asserted by the upstream authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal(pub String);

impl AuthenticatedPrincipal {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AuthenticatedPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read the principal from the identity header.
///
/// Blank and non-UTF-8 values count as no identity.
pub fn principal_from_headers(headers: &HeaderMap, header: &str) -> Option<AuthenticatedPrincipal> {
    let value = headers.get(header)?;
    let Ok(value) = value.to_str() else {
        tracing::debug!(header, "Ignoring non-UTF-8 identity header");
        return None;
    };
    let username = value.trim();
    (!username.is_empty()).then(|| AuthenticatedPrincipal(username.to_string()))
}

/// Middleware that attaches an [`AuthenticatedPrincipal`] extension when the
/// configured identity header is present.
///
/// Requests without one pass through unchanged; whether they are allowed is
/// decided by [`authz_middleware`](super::authz_middleware).
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(principal) = principal_from_headers(req.headers(), &state.config.auth.identity_header)
    {
        req.extensions_mut().insert(principal);
    }
    next.run(req).await
}
