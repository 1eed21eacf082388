//! # TiK API Server
//!
//! Ticket tracker exposing users, projects, tickets, comments and their
//! categories, levels and statuses over HTTP, backed by SQLite.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=... cargo run -p tik-api
//! ```

use anyhow::Context;
use tik_api::{app, config::Config, logging};
use tik_shared::{
    auth::password::PasswordHasher,
    db::{
        migrations::{get_migration_status, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let _log_guards = logging::init_logging(config.logging.dir.as_deref())?;

    info!("TiK API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    if config.api.debug {
        info!("Debug mode enabled: error responses carry diagnostic dumps");
    }

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("Failed to create database pool")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let status = get_migration_status(&pool)
        .await
        .context("Failed to read migration status")?;
    info!(
        applied = status.applied_migrations,
        latest_version = ?status.latest_version,
        "Database schema is up to date"
    );

    let hasher = PasswordHasher::new(config.password.memory_kib)
        .context("Invalid password hashing parameters")?;

    let bind_address = config.bind_address();
    let state = app::AppState::new(pool.clone(), config, hasher);
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    info!("Server listening on http://{}", bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received, draining connections...");
}
