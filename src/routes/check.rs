//! Forward-auth endpoint for reverse proxies.
//!
//! The proxy sends a subrequest carrying the caller's identity header and the
//! original request target; a 200 lets the request through, anything else is
//! returned to the client as-is.

use axum::{Json, extract::State, http::HeaderMap};

use crate::{
    AppState,
    authz::AuthorizationOutcome,
    middleware::{AuthzResponse, authorize_request, principal_from_headers},
};

/// Header set by Traefik and others for the original request target.
pub const FORWARDED_URI_HEADER: &str = "x-forwarded-uri";
/// Header set by nginx `auth_request` setups for the original request target.
pub const ORIGINAL_URI_HEADER: &str = "x-original-uri";

/// The request target the proxy is asking about.
pub fn forwarded_path(headers: &HeaderMap) -> &str {
    [FORWARDED_URI_HEADER, ORIGINAL_URI_HEADER]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or("/")
}

/// Authorize the forwarded request.
#[tracing::instrument(name = "authz.check", skip_all)]
pub async fn check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AuthorizationOutcome>, AuthzResponse> {
    let principal = principal_from_headers(&headers, &state.config.auth.identity_header);
    let path = forwarded_path(&headers);

    let outcome = authorize_request(&state, principal.as_ref(), path).await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{HeaderName, Request, StatusCode},
        routing::get,
    };
    use http_body_util::BodyExt;
    use rstest::rstest;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::PathgateConfig,
        tests::{FIXTURE, test_state_with},
    };

    fn router(config: PathgateConfig) -> Router {
        Router::new()
            .route("/authz/check", get(check))
            .with_state(test_state_with(config, FIXTURE))
    }

    async fn send(
        router: Router,
        headers: &[(&str, &str)],
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::get("/authz/check");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let response = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[rstest]
    #[case(&[(FORWARDED_URI_HEADER, "/a"), (ORIGINAL_URI_HEADER, "/b")], "/a")]
    #[case(&[(ORIGINAL_URI_HEADER, "/b")], "/b")]
    #[case(&[(FORWARDED_URI_HEADER, "  "), (ORIGINAL_URI_HEADER, "/b")], "/b")]
    #[case(&[], "/")]
    fn test_forwarded_path(#[case] headers: &[(&str, &str)], #[case] expected: &str) {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(HeaderName::from_bytes(name.as_bytes()).unwrap(), value.parse().unwrap());
        }
        assert_eq!(forwarded_path(&map), expected);
    }

    #[tokio::test]
    async fn test_permit_returns_outcome() {
        let (status, json) = send(
            router(PathgateConfig::default()),
            &[
                ("x-authenticated-user", "alice"),
                (FORWARDED_URI_HEADER, "/admin/users?page=2"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["decision"], "permit");
        assert_eq!(json["path"], "/admin/users");
        assert_eq!(json["matched_pattern"], "/admin/**");
    }

    #[tokio::test]
    async fn test_deny_is_forbidden() {
        let (status, json) = send(
            router(PathgateConfig::default()),
            &[
                ("x-authenticated-user", "carol"),
                (ORIGINAL_URI_HEADER, "/reports/q1"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"]["type"], "permission_error");
        assert_eq!(json["error"]["code"], "access_denied");
    }

    #[tokio::test]
    async fn test_missing_identity() {
        let (status, _) = send(
            router(PathgateConfig::default()),
            &[(FORWARDED_URI_HEADER, "/public")],
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut config = PathgateConfig::default();
        config.auth.allow_anonymous = true;
        let (status, json) = send(router(config), &[(FORWARDED_URI_HEADER, "/public")]).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["principal"].is_null());
    }

    #[tokio::test]
    async fn test_invalid_path_is_bad_request() {
        let (status, json) = send(
            router(PathgateConfig::default()),
            &[
                ("x-authenticated-user", "alice"),
                (FORWARDED_URI_HEADER, "/admin/%ff"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "invalid_path");
    }
}
