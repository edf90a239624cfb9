use std::time::{Duration, Instant};

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::server::app::AppState;

const DB_PING_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: DatabaseProbe,
    pool: PoolStats,
}

#[derive(Serialize)]
pub struct DatabaseProbe {
    status: &'static str,
    latency_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
pub struct PoolStats {
    size: u32,
    idle: usize,
    max: u32,
}

/// `GET /health`: 200 when Postgres answers a ping in time, 503 otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = ping(&state).await;
    let pool = PoolStats {
        size: state.db_pool.size(),
        idle: state.db_pool.num_idle(),
        max: state.db_pool.options().get_max_connections(),
    };

    let (code, status) = match database.error {
        None => (StatusCode::OK, "healthy"),
        Some(_) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };
    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database,
            pool,
        }),
    )
}

async fn ping(state: &AppState) -> DatabaseProbe {
    let started = Instant::now();
    let result =
        tokio::time::timeout(DB_PING_TIMEOUT, sqlx::query("SELECT 1").execute(&state.db_pool))
            .await;
    let error = match result {
        Ok(Ok(_)) => None,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Health check query failed");
            Some(e.to_string())
        }
        Err(_) => {
            tracing::warn!("Health check query timed out");
            Some(format!("no answer within {}s", DB_PING_TIMEOUT.as_secs()))
        }
    };
    DatabaseProbe {
        status: if error.is_none() { "ok" } else { "error" },
        latency_ms: started.elapsed().as_millis(),
        error,
    }
}
