//! # Web API Module
//!
//! Axum-based REST API for the Stackforge service.
//!
//! ## Core Components
//!
//! - [`routes`] - HTTP route definitions and organization
//! - [`handlers`] - Request handlers for the endpoint groups
//! - [`middleware`] - Request ID, rate limiting, and authentication
//! - [`state`] - Shared application state
//! - [`types`] - Web-specific error types and responses
//! - [`openapi`] - OpenAPI document

pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod types;

use axum::Router;

use state::AppState;

/// Create the main Axum application with all routes and middleware.
///
/// Health and documentation routes are public; the `/v1` API is wrapped in
/// rate limiting and authentication. Rate limiting sits outside auth so
/// credential failures are throttled too.
pub fn create_app(app_state: AppState) -> Router {
    let request_timeout =
        std::time::Duration::from_millis(app_state.config.web.request_timeout_ms);

    // Public routes - never require auth (probes, docs)
    let public_routes = Router::new()
        .merge(routes::health_routes())
        .merge(routes::docs_routes());

    // Protected routes - rate limiting then auth
    let protected_routes = Router::new()
        .nest("/v1", routes::api_v1_routes())
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            middleware::auth::authenticate_request,
        ))
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            middleware::rate_limit::enforce_rate_limit,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(
            middleware::request_id::add_request_id,
        ))
        .layer(tower_http::timeout::TimeoutLayer::new(request_timeout))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(app_state)
}
