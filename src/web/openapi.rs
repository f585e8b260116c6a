//! # OpenAPI Documentation
//!
//! OpenAPI 3 document for the Stackforge web API, generated with utoipa
//! and served as JSON.

use axum::Json;
use utoipa::OpenApi;

use crate::models::generation::PaginationInfo;
use crate::web::handlers::generations::{
    CreateGenerationRequest, GenerationCreationResponse, GenerationListResponse,
    GenerationResponse,
};
use crate::web::handlers::health::{HealthCheck, HealthResponse, ReadinessResponse};
use crate::web::handlers::stats::StatsResponse;
use crate::web::types::ApiError;

/// OpenAPI document for the Stackforge API.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::handlers::generations::create_generation,
        crate::web::handlers::generations::get_generation,
        crate::web::handlers::generations::list_generations,
        crate::web::handlers::generations::download_generation,
        crate::web::handlers::stats::get_stats,
        crate::web::handlers::health::basic_health,
        crate::web::handlers::health::liveness_probe,
        crate::web::handlers::health::readiness_probe,
    ),
    components(schemas(
        CreateGenerationRequest,
        GenerationResponse,
        GenerationCreationResponse,
        GenerationListResponse,
        PaginationInfo,
        StatsResponse,
        HealthResponse,
        HealthCheck,
        ReadinessResponse,
        ApiError,
    )),
    tags(
        (name = "generations", description = "Scaffold generation and delivery"),
        (name = "stats", description = "Aggregate service totals"),
        (name = "health", description = "Health and readiness probes"),
    ),
    info(
        title = "Stackforge API",
        description = "AI-assisted project scaffold generation service",
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document: GET /api-docs/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_includes_generation_paths() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("/v1/generations"));
        assert!(json.contains("/v1/generations/{uuid}/download"));
        assert!(json.contains("/health/ready"));
    }
}
