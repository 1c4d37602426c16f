//! Admin endpoints for resource rules and authority definitions.
//!
//! Writes go to the authority definition store and then invalidate the
//! registry, so the next authorization decision reloads the rules.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::{
    AppState,
    authz::{AuthoritySet, PathPattern, PatternCollision, RuleSet},
    models::Authority,
};

/// One row of the ordered rule table.
#[derive(Debug, Serialize)]
pub struct RuleView {
    pub pattern: String,
    pub required: AuthoritySet,
}

/// The loaded rule table in match order.
#[derive(Debug, Serialize)]
pub struct RulesResponse {
    pub loaded_at: DateTime<Utc>,
    pub rules: Vec<RuleView>,
    pub collisions: Vec<PatternCollision>,
}

impl From<&RuleSet> for RulesResponse {
    fn from(rules: &RuleSet) -> Self {
        Self {
            loaded_at: rules.loaded_at(),
            rules: rules
                .rules()
                .iter()
                .map(|rule| RuleView {
                    pattern: rule.pattern().to_string(),
                    required: rule.required().clone(),
                })
                .collect(),
            collisions: rules.collisions().to_vec(),
        }
    }
}

/// List resource rules, loading them if needed.
#[tracing::instrument(name = "admin.rules.list", skip(state))]
pub async fn list_rules(State(state): State<AppState>) -> Result<Json<RulesResponse>, ApiError> {
    let rules = state.authorizer.registry().rules().await?;
    Ok(Json(RulesResponse::from(rules.as_ref())))
}

/// Discard the cached rules and load them again.
#[tracing::instrument(name = "admin.rules.reload", skip(state))]
pub async fn reload_rules(State(state): State<AppState>) -> Result<Json<RulesResponse>, ApiError> {
    let rules = state.authorizer.registry().reload().await?;
    tracing::info!(rules = rules.len(), "Resource rules reloaded by admin request");
    Ok(Json(RulesResponse::from(rules.as_ref())))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAuthority {
    pub name: String,
    pub url: String,
}

/// Create an authority definition.
#[tracing::instrument(name = "admin.authorities.create", skip(state, input), fields(name = %input.name))]
pub async fn create_authority(
    State(state): State<AppState>,
    Json(input): Json<CreateAuthority>,
) -> Result<(StatusCode, Json<Authority>), ApiError> {
    let (name, url) = (input.name.trim(), input.url.trim());
    if name.is_empty() {
        return Err(ApiError::Validation("Authority name cannot be empty".into()));
    }
    if url.is_empty() {
        return Err(ApiError::Validation("Authority url cannot be empty".into()));
    }
    // A stored pattern that does not compile fails every later rule load.
    PathPattern::compile(url, state.config.auth.authz.case_sensitive)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let created = state
        .db
        .authorities()
        .create(Authority::new(name, url))
        .await?;
    state.authorizer.registry().invalidate();

    Ok((StatusCode::CREATED, Json(created)))
}

/// Delete an authority definition and its role grants.
#[tracing::instrument(name = "admin.authorities.delete", skip(state))]
pub async fn delete_authority(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.authorities().delete_by_name(&name).await?;
    state.authorizer.registry().invalidate();
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::{
        AppState, build_app,
        config::PathgateConfig,
        models::Authority,
        tests::{FIXTURE, test_state_with, test_state_with_store},
    };

    async fn send(
        router: Router,
        method: &str,
        path: &str,
        user: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder()
            .method(method)
            .uri(path)
            .header("x-authenticated-user", user);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn app(state: &AppState) -> Router {
        build_app(state.clone())
    }

    #[tokio::test]
    async fn test_list_rules_in_match_order() {
        let state = test_state_with(PathgateConfig::default(), FIXTURE);
        let (status, json) = send(app(&state), "GET", "/admin/authz/rules", "alice", None).await;

        assert_eq!(status, StatusCode::OK);
        let patterns: Vec<&str> = json["rules"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["pattern"].as_str().unwrap())
            .collect();
        assert_eq!(patterns, vec!["/reports/*", "/unused/**", "/admin/**"]);
        assert_eq!(json["rules"][2]["required"], serde_json::json!(["ROLE_ADMIN"]));
    }

    #[tokio::test]
    async fn test_admin_requires_authority() {
        let state = test_state_with(PathgateConfig::default(), FIXTURE);
        let (status, _) = send(app(&state), "GET", "/admin/authz/rules", "carol", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_reload_picks_up_store_changes() {
        let (store, state) = test_state_with_store(PathgateConfig::default(), FIXTURE);
        state.authorizer.registry().rules().await.unwrap();

        store.upsert_authority(Authority::new("ROLE_BILLING", "/billing/**"));
        assert_eq!(state.authorizer.registry().snapshot().unwrap().len(), 3);

        let (status, json) = send(app(&state), "POST", "/admin/authz/reload", "alice", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["rules"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_create_and_delete_authority() {
        let state = test_state_with(PathgateConfig::default(), FIXTURE);

        let (status, json) = send(
            app(&state),
            "POST",
            "/admin/authorities",
            "alice",
            Some(serde_json::json!({"name": " ROLE_BILLING ", "url": "/billing/**"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["name"], "ROLE_BILLING");

        let decision = state
            .authorizer
            .authorize("carol", "/billing/invoices")
            .await
            .unwrap();
        assert!(!decision.is_permit());

        let (status, _) = send(
            app(&state),
            "DELETE",
            "/admin/authorities/ROLE_BILLING",
            "alice",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let decision = state
            .authorizer
            .authorize("carol", "/billing/invoices")
            .await
            .unwrap();
        assert!(decision.is_permit());
    }

    #[tokio::test]
    async fn test_create_duplicate_and_delete_missing() {
        let state = test_state_with(PathgateConfig::default(), FIXTURE);

        let (status, json) = send(
            app(&state),
            "POST",
            "/admin/authorities",
            "alice",
            Some(serde_json::json!({"name": "ROLE_ADMIN", "url": "/other/**"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "conflict");

        let (status, _) = send(
            app(&state),
            "DELETE",
            "/admin/authorities/ROLE_MISSING",
            "alice",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_rejects_uncompilable_pattern() {
        let state = test_state_with(PathgateConfig::default(), FIXTURE);

        let (status, json) = send(
            app(&state),
            "POST",
            "/admin/authorities",
            "alice",
            Some(serde_json::json!({"name": "ROLE_BAD", "url": "/bad/["})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");

        let stored = state.db.authorities().list_all().await.unwrap();
        assert!(stored.iter().all(|a| a.name != "ROLE_BAD"));

        let decision = state
            .authorizer
            .authorize("alice", "/public/info")
            .await
            .unwrap();
        assert!(decision.is_permit());

        let (status, _) = send(app(&state), "GET", "/admin/authz/rules", "alice", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields() {
        let state = test_state_with(PathgateConfig::default(), FIXTURE);
        let (status, json) = send(
            app(&state),
            "POST",
            "/admin/authorities",
            "alice",
            Some(serde_json::json!({"name": "  ", "url": "/x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }
}
