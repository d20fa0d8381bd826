use std::path::Path;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the input and output directories exist and are writable.
    pub storage_ready: bool,
    /// Active storage layout (`per-job` or `shared`).
    pub layout: &'static str,
}

/// GET /health -- returns service and storage health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage_ready = dir_ready(state.storage.input_dir()).await
        && dir_ready(state.storage.output_dir()).await;

    let status = if storage_ready { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        storage_ready,
        layout: state.storage.layout().name(),
    })
}

/// Read-only check that `dir` is an existing, writable directory.
async fn dir_ready(dir: &Path) -> bool {
    match tokio::fs::metadata(dir).await {
        Ok(meta) => meta.is_dir() && !meta.permissions().readonly(),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Storage directory unavailable");
            false
        }
    }
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
