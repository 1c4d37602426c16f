//! Health check endpoints for load balancers and monitoring.

use axum::{Json, extract::State, response::IntoResponse};
use http::StatusCode;
use serde::Serialize;

use crate::{AppState, authz::RegistryStatus};

/// Detailed health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: &'static str,
    pub version: &'static str,
    /// Whether path authorization is enforced
    pub authz_enabled: bool,
    pub database: ComponentStatus,
    /// Resource rule cache state. Never triggers a load.
    pub registry: RegistryStatus,
}

/// Status of a single component.
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub backend: &'static str,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

/// Full health check: store connectivity and resource rule cache state.
///
/// An unloaded registry is not unhealthy; rules load on first use.
#[tracing::instrument(name = "health.check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = std::time::Instant::now();
    let db_result = state.db.health_check().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let database = ComponentStatus {
        backend: state.db.backend(),
        healthy: db_result.is_ok(),
        message: db_result.err().map(|e| e.to_string()),
        latency_ms,
    };
    let healthy = database.healthy;

    let health = HealthStatus {
        status: if healthy { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        authz_enabled: state.authorizer.is_enabled(),
        database,
        registry: state.authorizer.registry().status(),
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health))
}

/// Liveness check. Always 200 while the process is serving.
#[tracing::instrument(name = "health.liveness")]
pub async fn liveness() -> impl IntoResponse {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, http::Request, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::PathgateConfig,
        tests::{FIXTURE, test_state_with},
    };

    async fn get_health(state: AppState) -> (StatusCode, serde_json::Value) {
        let router = Router::new()
            .route("/health", get(health_check))
            .with_state(state);
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_unloaded_registry() {
        let state = test_state_with(PathgateConfig::default(), FIXTURE);
        let (status, json) = get_health(state.clone()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["database"]["backend"], "memory");
        assert_eq!(json["registry"]["loaded"], false);
        assert!(state.authorizer.registry().snapshot().is_none());
    }

    #[tokio::test]
    async fn test_health_reports_rule_count_after_load() {
        let state = test_state_with(PathgateConfig::default(), FIXTURE);
        state.authorizer.registry().rules().await.unwrap();

        let (_, json) = get_health(state).await;
        assert_eq!(json["registry"]["loaded"], true);
        assert_eq!(json["registry"]["rule_count"], 3);
        assert_eq!(json["registry"]["collision_count"], 0);
    }
}
