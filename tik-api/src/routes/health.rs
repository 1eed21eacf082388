/// Home and health check endpoints
///
/// # Endpoints
///
/// ```text
/// GET /         -> { "message": "Welcome to the TiK API!" }
/// GET /health   -> service, database and pool status
/// ```
///
/// # Health response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "migrations": "up_to_date",
///   "pool": { "active_connections": 1, "idle_connections": 2, "total_connections": 3 }
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tik_shared::db::{
    migrations::get_migration_status,
    pool::{get_pool_stats, health_check as probe},
};
use tracing::warn;

#[derive(Debug, Serialize, Deserialize)]
pub struct HomeResponse {
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,

    /// Application version
    pub version: String,

    /// "connected" or "disconnected"
    pub database: String,

    /// "up_to_date", "pending" or "unknown"
    pub migrations: String,

    pub pool: PoolStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PoolStatus {
    pub active_connections: usize,
    pub idle_connections: usize,
    pub total_connections: usize,
}

pub async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Welcome to the TiK API!".to_string(),
    })
}

/// Health check handler
///
/// Always answers 200; a failed database probe or pending migrations report
/// `degraded`.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match probe(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Database health probe failed");
            false
        }
    };

    let migrations = match get_migration_status(&state.db).await {
        Ok(status) if status.is_up_to_date => "up_to_date",
        Ok(_) => "pending",
        Err(e) => {
            warn!(error = %e, "Failed to read migration status");
            "unknown"
        }
    };

    let stats = get_pool_stats(&state.db);
    let healthy = connected && migrations == "up_to_date";

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        migrations: migrations.to_string(),
        pool: PoolStatus {
            active_connections: stats.active_connections,
            idle_connections: stats.idle_connections,
            total_connections: stats.total_connections,
        },
    })
}
