//! # Stats Handlers
//!
//! Aggregate service totals backed by the generations table.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::generation::Generation;
use crate::web::state::AppState;
use crate::web::types::{ApiError, ApiResult};

/// Aggregate totals response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub total_generations: i64,
    pub total_downloads: i64,
    pub distinct_prompts: i64,
    pub timestamp: String,
}

/// Service statistics: GET /v1/stats
#[utoipa::path(
    get,
    path = "/v1/stats",
    responses(
        (status = 200, description = "Aggregate service totals", body = StatsResponse),
        (status = 500, description = "Database failure", body = ApiError)
    ),
    tag = "stats"
)]
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let stats = Generation::stats(&state.db_pool).await?;

    Ok(Json(StatsResponse {
        total_generations: stats.total_generations,
        total_downloads: stats.total_downloads,
        distinct_prompts: stats.distinct_prompts,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}
