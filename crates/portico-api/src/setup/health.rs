//! Health probes.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;

use crate::state::AppState;

const DB_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub environment: String,
    pub database: String,
    pub storage_backend: &'static str,
}

/// Liveness: the process is up and serving.
pub async fn live() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness: the database answers within the timeout.
pub async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match tokio::time::timeout(
        DB_CHECK_TIMEOUT,
        sqlx::query("SELECT 1").execute(&state.pool),
    )
    .await
    {
        Ok(Ok(_)) => "healthy".to_string(),
        Ok(Err(e)) => format!("error: {}", e),
        Err(_) => "timeout".to_string(),
    };

    let healthy = database == "healthy";
    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        environment: state.config.environment.clone(),
        database,
        storage_backend: state.storage.backend_name(),
    };

    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(response))
}
