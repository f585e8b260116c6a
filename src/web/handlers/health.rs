//! # Health Check Handlers
//!
//! Kubernetes-compatible health check endpoints for monitoring and load
//! balancing.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::web::state::AppState;
use crate::web::types::ApiError;

/// Simple health response for liveness-style probes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Per-subsystem check result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Readiness response with subsystem checks.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: String,
    pub checks: HashMap<String, HealthCheck>,
}

/// Basic health check endpoint: GET /health
///
/// Returns OK whenever the service is running; available even while
/// dependencies are degraded.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn basic_health(_state: State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Kubernetes liveness probe: GET /health/live
#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn liveness_probe(_state: State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Kubernetes readiness probe: GET /health/ready
///
/// Checks database connectivity; not ready means the service should not
/// receive traffic yet.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessResponse),
        (status = 503, description = "Service is not ready", body = ApiError)
    ),
    tag = "health"
)]
pub async fn readiness_probe(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, ApiError> {
    debug!("Performing readiness probe");

    let mut checks = HashMap::new();

    let database_check = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db_pool)
        .await
    {
        Ok(_) => HealthCheck {
            status: "healthy".to_string(),
            message: None,
        },
        Err(e) => HealthCheck {
            status: "unhealthy".to_string(),
            message: Some(e.to_string()),
        },
    };

    let overall_healthy = database_check.status == "healthy";
    checks.insert("database".to_string(), database_check);

    let response = ReadinessResponse {
        status: if overall_healthy { "ready" } else { "not_ready" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        checks,
    };

    if overall_healthy {
        Ok(Json(response))
    } else {
        Err(ApiError::ServiceUnavailable)
    }
}
