//! # Web API Application State
//!
//! Shared state for the web API: configuration, database pool, the
//! generation service, and the rate limiter.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::StackforgeConfig;
use crate::error::{StackforgeError, StackforgeResult};
use crate::llm::LlmClient;
use crate::rules::RuleCatalog;
use crate::services::GenerationService;
use crate::storage;
use crate::web::middleware::rate_limit::RateLimiter;

/// Shared application state for the web API.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration
    pub config: Arc<StackforgeConfig>,

    /// Database pool shared by handlers and the generation service
    pub db_pool: PgPool,

    /// Scaffold generation pipeline
    pub generator: Arc<GenerationService>,

    /// Per-client request rate limiter
    pub rate_limiter: Arc<RateLimiter>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("bind_address", &self.config.web.bind_address)
            .field("auth_enabled", &self.config.web.auth.enabled)
            .field("rate_limiting_enabled", &self.config.web.rate_limiting.enabled)
            .finish()
    }
}

impl AppState {
    /// Build application state from configuration.
    ///
    /// The pool is created lazily; the first query (normally the migration
    /// run at startup) establishes connections and surfaces database
    /// misconfiguration.
    pub fn from_config(config: StackforgeConfig) -> StackforgeResult<Self> {
        let db = &config.database;
        let db_pool = PgPoolOptions::new()
            .max_connections(db.max_connections)
            .min_connections(db.min_connections)
            .acquire_timeout(Duration::from_secs(db.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(db.idle_timeout_seconds))
            .connect_lazy(&db.database_url())
            .map_err(|e| {
                StackforgeError::ConfigurationError(format!("invalid database URL: {e}"))
            })?;

        let llm = LlmClient::new(config.llm.clone())?;
        let store = storage::from_config(&config.storage)?;
        let catalog = RuleCatalog::default();

        let generator = Arc::new(GenerationService::new(
            db_pool.clone(),
            llm,
            store,
            catalog,
            config.generator.clone(),
        ));

        let rate_limiter = Arc::new(RateLimiter::new(
            config.web.rate_limiting.requests_per_minute,
            config.web.rate_limiting.burst_size,
        ));

        info!(
            bind_address = %config.web.bind_address,
            auth_enabled = config.web.auth.enabled,
            rate_limiting_enabled = config.web.rate_limiting.enabled,
            storage_backend = ?config.storage.backend,
            "Web API application state created"
        );

        Ok(Self {
            config: Arc::new(config),
            db_pool,
            generator,
            rate_limiter,
        })
    }
}
