use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use upscale_core::error::CoreError;
use upscale_core::storage::StorageError;
use upscale_core::upscaler::UpscaleError;
use upscale_core::workflow::WorkflowError;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain errors from `upscale_core` and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses of the form `{ "error": ..., "code": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `upscale_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A filesystem error outside a processing run (upload, download, delete).
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A failed processing run.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request body exceeded the configured upload limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Status, error code, message, and an optional directory listing.
type ErrorParts = (StatusCode, &'static str, String, Option<Vec<String>>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, listing) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Storage(err) => classify_storage_error(err),
            AppError::Workflow(err) => classify_workflow_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                msg.clone(),
                None,
            ),
            AppError::InternalError(msg) => internal(msg),
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(listing) = listing {
            body["listing"] = json!(listing);
        }

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> ErrorParts {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
            None,
        ),
        CoreError::Validation(msg) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
        }
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
        CoreError::Internal(msg) => internal(msg),
    }
}

/// Map filesystem failures onto the user-visible taxonomy.
///
/// Upload and delete failures carry the underlying I/O error so the user can
/// act on it (disk full, permissions). Read failures are sanitized.
fn classify_storage_error(err: &StorageError) -> ErrorParts {
    match err {
        StorageError::Upload { source, .. } => {
            tracing::error!(error = %err, "Upload failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "UPLOAD_FAILED",
                format!("Failed to store the upload: {source}"),
                None,
            )
        }
        StorageError::Prepare { source, .. } => {
            tracing::error!(error = %err, "Output directory unavailable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PROCESSING_FAILED",
                format!("Output directory is not usable: {source}"),
                None,
            )
        }
        StorageError::ResultNotFound { listing, .. } => (
            StatusCode::NOT_FOUND,
            "RESULT_NOT_FOUND",
            "Upscaled image not found. Please check the processing script.".to_string(),
            Some(listing.clone()),
        ),
        StorageError::Read { .. } => internal(&err.to_string()),
        StorageError::Delete { source, .. } => {
            tracing::error!(error = %err, "Delete failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DELETE_FAILED",
                format!("Error deleting the upscaled image: {source}"),
                None,
            )
        }
    }
}

fn classify_workflow_error(err: &WorkflowError) -> ErrorParts {
    match err {
        WorkflowError::Storage(storage) => classify_storage_error(storage),
        WorkflowError::Upscale(upscale) => {
            let message = match upscale {
                UpscaleError::Io(_) => "An error occurred while running the upscaler".to_string(),
                other => format!("An error occurred during processing: {other}"),
            };
            tracing::warn!(error = %upscale, "Processing failed");
            (StatusCode::BAD_GATEWAY, "PROCESSING_FAILED", message, None)
        }
        WorkflowError::Decode(decode) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "DECODE_FAILED",
            format!("Failed to open the upscaled image: {decode}"),
            None,
        ),
        WorkflowError::Internal(msg) => internal(msg),
    }
}

fn internal(msg: &str) -> ErrorParts {
    tracing::error!(error = %msg, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
        None,
    )
}
