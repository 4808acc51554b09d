//! Server setup and initialization
//!
//! Provides the application builder, the dependency wiring and the runner that
//! starts the HTTP surface together with the expiration scheduler.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use warranty_common::{AppConfig, AppError};
use warranty_db::{create_pool, default_migrations_dir, run_migrations, PoolConfig};
use warranty_service::ServiceContextBuilder;
use warranty_worker::ExpirationScheduler;

use crate::middleware::apply_middleware;
use crate::platform::DiscordPlatform;
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let router = create_router().merge(health_routes());
    let router = apply_middleware(router);
    router.with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&PoolConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    let migrations_dir = config
        .database
        .migrations_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(default_migrations_dir);
    run_migrations(&pool, &migrations_dir)
        .await
        .map_err(|e| AppError::Database(format!("Migration failed: {e}")))?;

    let discord = Arc::new(DiscordPlatform::new(
        &config.discord,
        config.engine.store_timeout(),
    )?);

    let service_context = ServiceContextBuilder::new()
        .postgres(&pool)
        .platform(discord.clone())
        .notifier(discord)
        .config(&config)
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(Arc::new(service_context), pool, config))
}

/// Run the HTTP server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Server(e.to_string()))?;

    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let address = config.api.address();
    let addr = tokio::net::lookup_host(&address)
        .await
        .map_err(|e| AppError::Config(format!("Invalid listen address {address}: {e}")))?
        .next()
        .ok_or_else(|| AppError::Config(format!("Listen address {address} did not resolve")))?;
    let schedule = config.schedule.clone();

    let state = create_app_state(config).await?;

    let mut scheduler = ExpirationScheduler::new(state.shared_context(), schedule).await?;
    match scheduler.run_startup_sweep().await {
        Ok(report) => info!(repaired = report.repaired, "Startup integrity sweep complete"),
        // The next join or sweep converges whatever was missed
        Err(e) => warn!(error = %e, "Startup integrity sweep failed"),
    }
    scheduler.register_default_jobs().await?;
    scheduler.start().await?;

    let app = create_app(state);
    let result = run_server(app, addr).await;

    if let Err(e) = scheduler.shutdown().await {
        error!(error = %e, "Scheduler did not shut down cleanly");
    }
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
