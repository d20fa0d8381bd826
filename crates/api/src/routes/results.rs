use axum::routing::get;
use axum::Router;

use crate::handlers::results;
use crate::state::AppState;

/// Routes mounted at `/results`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(results::list_outputs))
}
