//! # Stackforge Server
//!
//! Production deployment target for the Stackforge scaffold generation
//! service.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin stackforge-server
//!
//! # Run with specific environment
//! STACKFORGE_ENV=production cargo run --bin stackforge-server
//! ```

use tokio::signal;
use tracing::info;

use stackforge::config::ConfigLoader;
use stackforge::logging;
use stackforge::web::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();
    logging::init_structured_logging();

    info!("🚀 Starting Stackforge Server...");
    info!("   Version: {}", env!("CARGO_PKG_VERSION"));
    info!("   Environment: {}", logging::get_environment());

    let config = ConfigLoader::from_env()
        .load()
        .map_err(|e| format!("Failed to load configuration: {e}"))?;

    let state = AppState::from_config(config)
        .map_err(|e| format!("Failed to build application state: {e}"))?;

    info!("🔧 Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&state.db_pool)
        .await
        .map_err(|e| format!("Failed to run migrations: {e}"))?;

    let bind_address = state.config.web.bind_address.clone();
    let app = stackforge::web::create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|e| format!("Failed to bind {bind_address}: {e}"))?;

    info!("🎉 Stackforge Server listening on {bind_address}");
    info!("   Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Stackforge Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
}
