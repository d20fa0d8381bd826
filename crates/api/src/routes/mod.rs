pub mod health;
pub mod jobs;
pub mod page;
pub mod results;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /jobs                          list, upload (multipart `file`)
/// /jobs/{id}                     get
/// /jobs/{id}/input               uploaded image
/// /jobs/{id}/upscale             run the upscaler (POST)
/// /jobs/{id}/result              download / view (GET), delete (DELETE)
///
/// /results                       output directory listing
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/results", results::router())
}
