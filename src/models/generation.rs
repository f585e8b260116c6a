//! # Generation Model
//!
//! The persisted generation record: prompt text, cache key, stack
//! selection, artifact location, download counter, optional owning
//! subject, and creation timestamp.
//!
//! ## Database Schema
//!
//! Maps to `stackforge.generations`:
//! - `generation_uuid`: primary key (client-generated UUID v4)
//! - `prompt_hash`: SHA-256 cache key (VARCHAR(64), indexed, non-unique)
//! - `stack`: JSONB array of selected technologies
//! - `download_count`: BIGINT counter incremented on download
//!
//! The `prompt_hash` index is deliberately non-unique: the cache is
//! best-effort read-then-write, and concurrent writers may insert duplicate
//! rows for the same key. Lookups order by recency and take one row.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;
use uuid::Uuid;

/// A synthesized scaffold and its delivery state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Generation {
    pub generation_uuid: Uuid,
    pub prompt: String,
    pub prompt_hash: String,
    pub stack: serde_json::Value,
    pub project_name: String,
    pub artifact_key: String,
    pub artifact_url: String,
    pub download_count: i64,
    pub requested_by: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Generation {
    /// Decode the JSONB stack column into a list of technology names.
    pub fn stack_entries(&self) -> Vec<String> {
        serde_json::from_value(self.stack.clone()).unwrap_or_default()
    }
}

/// New generation record for insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGeneration {
    pub generation_uuid: Uuid,
    pub prompt: String,
    pub prompt_hash: String,
    pub stack: serde_json::Value,
    pub project_name: String,
    pub artifact_key: String,
    pub artifact_url: String,
    pub requested_by: Option<String>,
}

/// Query parameters for generation listing with pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationListQuery {
    pub page: u32,
    pub per_page: u32,
}

impl Default for GenerationListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 25,
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginationInfo {
    pub page: u32,
    pub per_page: u32,
    pub total_count: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Paginated results for generation listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedGenerationList {
    pub generations: Vec<Generation>,
    pub pagination: PaginationInfo,
}

/// Aggregate totals for the stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GenerationStats {
    pub total_generations: i64,
    pub total_downloads: i64,
    pub distinct_prompts: i64,
}

const GENERATION_COLUMNS: &str = "generation_uuid, prompt, prompt_hash, stack, project_name, \
                                  artifact_key, artifact_url, download_count, requested_by, \
                                  created_at";

impl Generation {
    /// Insert a new generation record.
    pub async fn create(pool: &PgPool, new: NewGeneration) -> Result<Generation, sqlx::Error> {
        let sql = format!(
            "INSERT INTO stackforge.generations \
             (generation_uuid, prompt, prompt_hash, stack, project_name, artifact_key, \
              artifact_url, download_count, requested_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, NOW()) \
             RETURNING {GENERATION_COLUMNS}"
        );

        sqlx::query_as::<_, Generation>(&sql)
            .bind(new.generation_uuid)
            .bind(new.prompt)
            .bind(new.prompt_hash)
            .bind(new.stack)
            .bind(new.project_name)
            .bind(new.artifact_key)
            .bind(new.artifact_url)
            .bind(new.requested_by)
            .fetch_one(pool)
            .await
    }

    /// Cache lookup: most recent record for a prompt hash, if any.
    pub async fn find_by_prompt_hash(
        pool: &PgPool,
        prompt_hash: &str,
    ) -> Result<Option<Generation>, sqlx::Error> {
        let sql = format!(
            "SELECT {GENERATION_COLUMNS} FROM stackforge.generations \
             WHERE prompt_hash = $1 ORDER BY created_at DESC LIMIT 1"
        );

        sqlx::query_as::<_, Generation>(&sql)
            .bind(prompt_hash)
            .fetch_optional(pool)
            .await
    }

    /// Find a generation by primary key.
    pub async fn find_by_id(pool: &PgPool, uuid: Uuid) -> Result<Option<Generation>, sqlx::Error> {
        let sql = format!(
            "SELECT {GENERATION_COLUMNS} FROM stackforge.generations WHERE generation_uuid = $1"
        );

        sqlx::query_as::<_, Generation>(&sql)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }

    /// Atomically increment the download counter and return the updated row.
    pub async fn increment_download_count(
        pool: &PgPool,
        uuid: Uuid,
    ) -> Result<Option<Generation>, sqlx::Error> {
        let sql = format!(
            "UPDATE stackforge.generations SET download_count = download_count + 1 \
             WHERE generation_uuid = $1 RETURNING {GENERATION_COLUMNS}"
        );

        sqlx::query_as::<_, Generation>(&sql)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }

    /// List generations, newest first, with pagination metadata.
    pub async fn list(
        pool: &PgPool,
        query: &GenerationListQuery,
    ) -> Result<PaginatedGenerationList, sqlx::Error> {
        let page = query.page.max(1);
        let per_page = query.per_page.clamp(1, 100);
        let offset = i64::from(page - 1) * i64::from(per_page);

        let sql = format!(
            "SELECT {GENERATION_COLUMNS} FROM stackforge.generations \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );

        let generations = sqlx::query_as::<_, Generation>(&sql)
            .bind(i64::from(per_page))
            .bind(offset)
            .fetch_all(pool)
            .await?;

        let total_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stackforge.generations")
                .fetch_one(pool)
                .await?;

        let total_count = total_count.max(0) as u64;
        let total_pages = total_count.div_ceil(u64::from(per_page)) as u32;

        Ok(PaginatedGenerationList {
            generations,
            pagination: PaginationInfo {
                page,
                per_page,
                total_count,
                total_pages,
                has_next: page < total_pages,
                has_previous: page > 1 && total_count > 0,
            },
        })
    }

    /// Aggregate totals across all generations.
    pub async fn stats(pool: &PgPool) -> Result<GenerationStats, sqlx::Error> {
        sqlx::query_as::<_, GenerationStats>(
            "SELECT COUNT(*) AS total_generations, \
                    COALESCE(SUM(download_count), 0)::BIGINT AS total_downloads, \
                    COUNT(DISTINCT prompt_hash) AS distinct_prompts \
             FROM stackforge.generations",
        )
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_entries_decodes_json_array() {
        let generation = Generation {
            generation_uuid: Uuid::new_v4(),
            prompt: "a react app".to_string(),
            prompt_hash: "0".repeat(64),
            stack: serde_json::json!(["react", "postgresql"]),
            project_name: "demo".to_string(),
            artifact_key: "scaffolds/x.zip".to_string(),
            artifact_url: "http://localhost/x.zip".to_string(),
            download_count: 0,
            requested_by: None,
            created_at: chrono::Utc::now().naive_utc(),
        };

        assert_eq!(generation.stack_entries(), vec!["react", "postgresql"]);
    }

    #[test]
    fn test_stack_entries_tolerates_malformed_column() {
        let generation = Generation {
            generation_uuid: Uuid::new_v4(),
            prompt: String::new(),
            prompt_hash: String::new(),
            stack: serde_json::json!({"not": "an array"}),
            project_name: String::new(),
            artifact_key: String::new(),
            artifact_url: String::new(),
            download_count: 0,
            requested_by: None,
            created_at: chrono::Utc::now().naive_utc(),
        };

        assert!(generation.stack_entries().is_empty());
    }

    #[test]
    fn test_list_query_defaults() {
        let query = GenerationListQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 25);
    }
}
