//! # Generation Handlers
//!
//! HTTP handlers for scaffold creation, retrieval, listing, and download
//! delivery. Creation is the heavy endpoint: cache misses call the LLM
//! provider and can take tens of seconds.

use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::{Extension, Json};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::generation::{Generation, GenerationListQuery, PaginationInfo};
use crate::services::GenerationRequest;
use crate::web::middleware::auth::AuthContext;
use crate::web::state::AppState;
use crate::web::types::{ApiError, ApiResult};

/// Request body for creating a generation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateGenerationRequest {
    /// Free-form description of the desired project
    pub prompt: String,
    /// Explicit technology selections from the stack picker
    #[serde(default)]
    pub stack: Vec<String>,
    /// Optional project name; derived from the model output when absent
    #[serde(default)]
    pub project_name: Option<String>,
}

/// A generation record as exposed by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerationResponse {
    pub generation_uuid: Uuid,
    pub prompt: String,
    pub stack: Vec<String>,
    pub project_name: String,
    pub artifact_url: String,
    pub download_count: i64,
    pub requested_by: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<Generation> for GenerationResponse {
    fn from(generation: Generation) -> Self {
        let stack = generation.stack_entries();
        Self {
            generation_uuid: generation.generation_uuid,
            prompt: generation.prompt,
            stack,
            project_name: generation.project_name,
            artifact_url: generation.artifact_url,
            download_count: generation.download_count,
            requested_by: generation.requested_by,
            created_at: generation.created_at,
        }
    }
}

/// Response for generation creation; `cached` reports whether the request
/// was served from the cache.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerationCreationResponse {
    pub cached: bool,
    #[serde(flatten)]
    pub generation: GenerationResponse,
}

/// Query parameters for generation listing.
#[derive(Debug, Clone, Serialize, Deserialize, IntoParams)]
pub struct ListGenerationsQuery {
    /// Page number, 1-based
    #[serde(default = "default_page")]
    pub page: u32,
    /// Page size, capped at 100
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    25
}

/// Paginated listing response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerationListResponse {
    pub generations: Vec<GenerationResponse>,
    pub pagination: PaginationInfo,
}

/// Create a generation: POST /v1/generations
///
/// Serves a cached record when the normalized prompt and stack selection
/// have been seen before; otherwise synthesizes, packages, and stores a new
/// scaffold.
#[utoipa::path(
    post,
    path = "/v1/generations",
    request_body = CreateGenerationRequest,
    responses(
        (status = 200, description = "Generation created or served from cache", body = GenerationCreationResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 502, description = "LLM provider or storage failure", body = ApiError)
    ),
    tag = "generations"
)]
pub async fn create_generation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateGenerationRequest>,
) -> ApiResult<Json<GenerationCreationResponse>> {
    info!(
        prompt_len = request.prompt.len(),
        stack = ?request.stack,
        subject = ?auth.subject,
        "Creating generation via web API"
    );

    if request.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("Prompt cannot be empty"));
    }

    let outcome = state
        .generator
        .generate(GenerationRequest {
            prompt: request.prompt,
            stack: request.stack,
            project_name: request.project_name,
            requested_by: auth.subject,
        })
        .await?;

    info!(
        generation_uuid = %outcome.generation.generation_uuid,
        cached = outcome.cache_hit,
        "Generation request served"
    );

    Ok(Json(GenerationCreationResponse {
        cached: outcome.cache_hit,
        generation: outcome.generation.into(),
    }))
}

/// Get generation details: GET /v1/generations/{uuid}
#[utoipa::path(
    get,
    path = "/v1/generations/{uuid}",
    params(
        ("uuid" = String, Path, description = "Generation UUID")
    ),
    responses(
        (status = 200, description = "Generation details", body = GenerationResponse),
        (status = 404, description = "Generation not found", body = ApiError)
    ),
    tag = "generations"
)]
pub async fn get_generation(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> ApiResult<Json<GenerationResponse>> {
    debug!(generation_uuid = %uuid, "Retrieving generation");

    let uuid = Uuid::parse_str(&uuid).map_err(|_| ApiError::invalid_uuid(uuid))?;

    let generation = Generation::find_by_id(&state.db_pool, uuid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Generation {uuid} not found")))?;

    Ok(Json(generation.into()))
}

/// List generations: GET /v1/generations
#[utoipa::path(
    get,
    path = "/v1/generations",
    params(ListGenerationsQuery),
    responses(
        (status = 200, description = "Paginated generation listing", body = GenerationListResponse)
    ),
    tag = "generations"
)]
pub async fn list_generations(
    State(state): State<AppState>,
    Query(query): Query<ListGenerationsQuery>,
) -> ApiResult<Json<GenerationListResponse>> {
    let list = Generation::list(
        &state.db_pool,
        &GenerationListQuery {
            page: query.page,
            per_page: query.per_page,
        },
    )
    .await?;

    Ok(Json(GenerationListResponse {
        generations: list.generations.into_iter().map(Into::into).collect(),
        pagination: list.pagination,
    }))
}

/// Download a generation: GET /v1/generations/{uuid}/download
///
/// Increments the download counter and redirects to the stored artifact.
#[utoipa::path(
    get,
    path = "/v1/generations/{uuid}/download",
    params(
        ("uuid" = String, Path, description = "Generation UUID")
    ),
    responses(
        (status = 307, description = "Redirect to the artifact URL"),
        (status = 404, description = "Generation not found", body = ApiError)
    ),
    tag = "generations"
)]
pub async fn download_generation(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> ApiResult<Redirect> {
    let uuid = Uuid::parse_str(&uuid).map_err(|_| ApiError::invalid_uuid(uuid))?;

    let generation = Generation::increment_download_count(&state.db_pool, uuid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Generation {uuid} not found")))?;

    info!(
        generation_uuid = %uuid,
        download_count = generation.download_count,
        "Generation download served"
    );

    Ok(Redirect::temporary(&generation.artifact_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_response_from_model() {
        let generation = Generation {
            generation_uuid: Uuid::new_v4(),
            prompt: "a react app".to_string(),
            prompt_hash: "0".repeat(64),
            stack: serde_json::json!(["react"]),
            project_name: "demo".to_string(),
            artifact_key: "scaffolds/x.zip".to_string(),
            artifact_url: "http://localhost/x.zip".to_string(),
            download_count: 3,
            requested_by: Some("ci".to_string()),
            created_at: chrono::Utc::now().naive_utc(),
        };

        let response = GenerationResponse::from(generation.clone());
        assert_eq!(response.generation_uuid, generation.generation_uuid);
        assert_eq!(response.stack, vec!["react"]);
        assert_eq!(response.download_count, 3);
    }

    #[test]
    fn test_creation_response_flattens_generation() {
        let response = GenerationCreationResponse {
            cached: true,
            generation: GenerationResponse {
                generation_uuid: Uuid::new_v4(),
                prompt: "p".to_string(),
                stack: vec![],
                project_name: "demo".to_string(),
                artifact_url: "http://x/y.zip".to_string(),
                download_count: 0,
                requested_by: None,
                created_at: chrono::Utc::now().naive_utc(),
            },
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["cached"], serde_json::json!(true));
        // Flattened: generation fields at the top level
        assert_eq!(value["project_name"], serde_json::json!("demo"));
    }

    #[test]
    fn test_list_query_defaults() {
        let query: ListGenerationsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 25);
    }
}
