//! # Web API Route Definitions
//!
//! HTTP route structure for the Stackforge web API, organized into logical
//! groups with versioning.

use axum::routing::{get, post};
use axum::Router;

use crate::web::handlers;
use crate::web::state::AppState;

/// Create API v1 routes.
///
/// All v1 routes are prefixed with `/v1` and include:
/// - Generations API - scaffold creation, retrieval, listing, download
/// - Stats API - aggregate service totals
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Generations API
        .route(
            "/generations",
            post(handlers::generations::create_generation),
        )
        .route("/generations", get(handlers::generations::list_generations))
        .route(
            "/generations/:uuid",
            get(handlers::generations::get_generation),
        )
        .route(
            "/generations/:uuid/download",
            get(handlers::generations::download_generation),
        )
        // Stats API (read-only)
        .route("/stats", get(handlers::stats::get_stats))
}

/// Create health routes.
///
/// Health endpoints are grouped under `/health`:
/// - `/health` - basic health check
/// - `/health/ready` - Kubernetes readiness probe
/// - `/health/live` - Kubernetes liveness probe
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::basic_health))
        .route("/health/ready", get(handlers::health::readiness_probe))
        .route("/health/live", get(handlers::health::liveness_probe))
}

/// Create API documentation routes.
///
/// Serves the OpenAPI specification at `/api-docs/openapi.json`.
pub fn docs_routes() -> Router<AppState> {
    Router::new().route(
        "/api-docs/openapi.json",
        get(crate::web::openapi::openapi_json),
    )
}
