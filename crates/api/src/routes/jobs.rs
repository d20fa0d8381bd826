use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(jobs::list_jobs).post(jobs::upload))
        .route("/{id}", get(jobs::get_job))
        .route("/{id}/input", get(jobs::get_input))
        .route("/{id}/upscale", post(jobs::upscale))
        .route(
            "/{id}/result",
            get(jobs::get_result).delete(jobs::delete_result),
        )
}
