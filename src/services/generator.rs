//! # Generation Service
//!
//! The request pipeline: normalize and key the prompt, consult the cache,
//! compile the ruleset into the system prompt, ask the model, package the
//! tree, upload the archive, and record the generation.
//!
//! The cache is a best-effort read-then-write against the generations
//! table; there is no cross-process coordination. Within one process an
//! in-flight guard per cache key serializes identical requests so a burst
//! of the same prompt costs one LLM call, with the cache re-checked under
//! the guard.

use std::sync::Arc;

use dashmap::DashMap;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::GeneratorConfig;
use crate::error::{StackforgeError, StackforgeResult};
use crate::llm::LlmClient;
use crate::models::generation::{Generation, NewGeneration};
use crate::rules::{cache_key, normalize_prompt, RuleCatalog};
use crate::archive;
use crate::storage::ArtifactStore;

/// A validated scaffold request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub stack: Vec<String>,
    pub project_name: Option<String>,
    pub requested_by: Option<String>,
}

/// Result of serving a scaffold request.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub generation: Generation,
    pub cache_hit: bool,
}

/// Orchestrates scaffold generation and caching.
pub struct GenerationService {
    pool: PgPool,
    llm: LlmClient,
    store: Arc<dyn ArtifactStore>,
    catalog: RuleCatalog,
    limits: GeneratorConfig,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for GenerationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationService")
            .field("llm", &self.llm)
            .field("catalog_rules", &self.catalog.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl GenerationService {
    pub fn new(
        pool: PgPool,
        llm: LlmClient,
        store: Arc<dyn ArtifactStore>,
        catalog: RuleCatalog,
        limits: GeneratorConfig,
    ) -> Self {
        Self {
            pool,
            llm,
            store,
            catalog,
            limits,
            in_flight: DashMap::new(),
        }
    }

    /// Serve a scaffold request, from cache when possible.
    #[instrument(skip(self, request), fields(prompt_len = request.prompt.len()))]
    pub async fn generate(&self, request: GenerationRequest) -> StackforgeResult<GenerationOutcome> {
        self.validate_request(&request)?;

        let normalized = normalize_prompt(&request.prompt);
        let key = cache_key(&request.prompt, &request.stack);

        if let Some(hit) = Generation::find_by_prompt_hash(&self.pool, &key).await? {
            info!(prompt_hash = %key, generation_uuid = %hit.generation_uuid, "Cache hit");
            return Ok(GenerationOutcome {
                generation: hit,
                cache_hit: true,
            });
        }

        // Serialize identical prompts within this process. A guard entry may
        // be recreated by a late arrival after removal; the re-check below
        // keeps that harmless.
        let flight = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = flight.lock().await;

        let outcome = match Generation::find_by_prompt_hash(&self.pool, &key).await? {
            Some(hit) => {
                info!(prompt_hash = %key, generation_uuid = %hit.generation_uuid, "Cache hit after flight wait");
                Ok(GenerationOutcome {
                    generation: hit,
                    cache_hit: true,
                })
            }
            None => self
                .generate_uncached(&request, &normalized, &key)
                .await
                .map(|generation| GenerationOutcome {
                    generation,
                    cache_hit: false,
                }),
        };

        drop(guard);
        self.in_flight.remove(&key);

        outcome
    }

    fn validate_request(&self, request: &GenerationRequest) -> StackforgeResult<()> {
        let prompt = request.prompt.trim();
        if prompt.is_empty() {
            return Err(StackforgeError::ValidationError(
                "prompt cannot be empty".to_string(),
            ));
        }
        if prompt.chars().count() > self.limits.max_prompt_chars {
            return Err(StackforgeError::ValidationError(format!(
                "prompt exceeds {} characters",
                self.limits.max_prompt_chars
            )));
        }
        if request.stack.len() > self.limits.max_stack_entries {
            return Err(StackforgeError::ValidationError(format!(
                "stack selection exceeds {} entries",
                self.limits.max_stack_entries
            )));
        }
        Ok(())
    }

    async fn generate_uncached(
        &self,
        request: &GenerationRequest,
        normalized: &str,
        key: &str,
    ) -> StackforgeResult<Generation> {
        let system_prompt = self
            .catalog
            .compile_system_prompt(normalized, &request.stack);
        let user_prompt = build_user_prompt(request);

        let tree = self
            .llm
            .generate_project(&system_prompt, &user_prompt)
            .await
            .inspect_err(|e| error!(prompt_hash = %key, error = %e, "Scaffold synthesis failed"))?;
        tree.validate(&self.limits)?;

        let project_name = sanitize_project_name(
            request
                .project_name
                .as_deref()
                .or(tree.name.as_deref())
                .unwrap_or("scaffold"),
        );

        let archive_bytes = archive::build_zip(&project_name, &tree)?;
        let archive_size = archive_bytes.len();

        let generation_uuid = Uuid::new_v4();
        let artifact_key = format!("{}/{generation_uuid}.zip", self.limits.artifact_prefix);
        let stored = self
            .store
            .put(&artifact_key, archive_bytes, "application/zip")
            .await?;

        let generation = Generation::create(
            &self.pool,
            NewGeneration {
                generation_uuid,
                prompt: request.prompt.trim().to_string(),
                prompt_hash: key.to_string(),
                stack: serde_json::json!(request.stack),
                project_name: project_name.clone(),
                artifact_key: stored.key,
                artifact_url: stored.url,
                requested_by: request.requested_by.clone(),
            },
        )
        .await?;

        info!(
            generation_uuid = %generation.generation_uuid,
            prompt_hash = %key,
            project_name = %project_name,
            files = tree.files.len(),
            archive_bytes = archive_size,
            "Scaffold generated and stored"
        );

        Ok(generation)
    }
}

/// Build the user message for the model.
fn build_user_prompt(request: &GenerationRequest) -> String {
    let mut prompt = format!("Project request: {}\n", request.prompt.trim());
    if !request.stack.is_empty() {
        prompt.push_str(&format!(
            "Selected technologies: {}\n",
            request.stack.join(", ")
        ));
    }
    if let Some(name) = &request.project_name {
        prompt.push_str(&format!("Project name: {name}\n"));
    }
    prompt
}

/// Reduce a requested project name to a safe directory name.
///
/// Lowercases, maps runs of non-alphanumerics to single dashes, and bounds
/// the length. Falls back to `scaffold` when nothing survives.
pub fn sanitize_project_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    let mut last_dash = true;

    for c in raw.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
            last_dash = false;
        } else if !last_dash {
            name.push('-');
            last_dash = true;
        }
    }

    let name = name.trim_matches('-').to_string();
    let name: String = name.chars().take(64).collect();
    let name = name.trim_matches('-').to_string();

    if name.is_empty() {
        "scaffold".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_project_name_maps_symbols_to_dashes() {
        assert_eq!(sanitize_project_name("My Cool App!"), "my-cool-app");
        assert_eq!(sanitize_project_name("a__b..c"), "a-b-c");
    }

    #[test]
    fn test_sanitize_project_name_falls_back() {
        assert_eq!(sanitize_project_name("!!!"), "scaffold");
        assert_eq!(sanitize_project_name(""), "scaffold");
    }

    #[test]
    fn test_sanitize_project_name_bounds_length() {
        let long = "x".repeat(200);
        assert_eq!(sanitize_project_name(&long).len(), 64);
    }

    #[test]
    fn test_user_prompt_includes_stack_and_name() {
        let request = GenerationRequest {
            prompt: "a todo api".to_string(),
            stack: vec!["express".to_string(), "postgresql".to_string()],
            project_name: Some("todos".to_string()),
            requested_by: None,
        };

        let prompt = build_user_prompt(&request);
        assert!(prompt.contains("a todo api"));
        assert!(prompt.contains("express, postgresql"));
        assert!(prompt.contains("Project name: todos"));
    }
}
