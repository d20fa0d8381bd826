//! Read-only view of the output directory.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OutputListing {
    /// The configured output directory.
    pub directory: String,
    /// File names found directly inside it, sorted.
    pub entries: Vec<String>,
}

/// GET /api/v1/results
///
/// Useful when an upscaler writes its result under an unexpected name.
pub async fn list_outputs(State(state): State<AppState>) -> Json<DataResponse<OutputListing>> {
    let entries = state.storage.list_output_dir().await;
    Json(DataResponse {
        data: OutputListing {
            directory: state.storage.output_dir().display().to_string(),
            entries,
        },
    })
}
