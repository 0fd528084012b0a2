//! Server startup and shutdown.
//!
//! `run_server` opens the configured document store, optionally migrates it,
//! builds the origin policy and application state, and serves the router until
//! a shutdown signal arrives.

use crate::auth::AuthService;
use crate::config::Config;
use crate::cors::OriginMatcher;
use crate::error::{AppError, AppResult};
use crate::routes;
use crate::state;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Run the web server with the given configuration.
///
/// # Errors
///
/// Fails if the store cannot be opened or migrated, the upload directory
/// cannot be created, the address cannot be bound, or the server itself
/// errors while running.
pub async fn run_server(config: Config, addr: String, should_migrate: bool) -> AppResult<()> {
    info!("Starting recipeshare server...");

    info!(backend = ?config.store.backend, "Opening document store...");
    let repository = crate::db::connect(&config.store).await?;

    if should_migrate {
        info!("Running store migrations...");
        repository.run_migrations().await?;
        info!("Migrations completed successfully");
    }

    let origin_policy = Arc::new(OriginMatcher::build(&config.cors.origins));
    if origin_policy.allows_all() {
        info!("CORS: allowing every origin");
    } else if origin_policy.denies_all() {
        warn!("CORS: no usable origin patterns, cross-origin browser requests will be refused");
    } else {
        info!(patterns = ?origin_policy.patterns(), "CORS: allowing configured origins");
    }

    tokio::fs::create_dir_all(&config.upload.dir).await?;

    let auth_service = AuthService::new(
        config.auth.jwt_secret.clone(),
        config.auth.jwt_expiration_hours,
    )
    .with_bcrypt_cost(config.auth.bcrypt_cost);

    let state = Arc::new(state::AppState {
        repository,
        auth_service,
        public_url: config.server.public_url.clone(),
        upload_dir: config.upload.dir.clone(),
    });

    let app = routes::create_router(
        state,
        origin_policy,
        &config.rate_limit,
        config.upload.max_body_bytes,
    )?;

    info!("Binding to {}", addr);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Server listening on {}", addr);
    info!("Public URL: {}", config.server.public_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
///
/// # Panics
///
/// Panics if a signal handler cannot be installed, since graceful shutdown is
/// impossible without one.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    info!("Shutdown signal received");
}
