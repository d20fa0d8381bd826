//! Handlers for the `/jobs` resource.
//!
//! A job is created by uploading an image, processed on explicit request,
//! and its result can then be viewed, downloaded and deleted.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, ETAG};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use upscale_core::hashing::etag_for;
use upscale_core::job::UpscaleJob;
use upscale_core::naming;
use upscale_core::storage::StorageError;
use upscale_core::types::{new_job_id, JobId};
use upscale_core::workflow;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /jobs/{id}/result`.
#[derive(Debug, Default, Deserialize)]
pub struct ResultQuery {
    /// Serve for display (`inline`) rather than as a download.
    #[serde(default)]
    pub inline: bool,
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs
///
/// Accepts a multipart form with a required `file` field. The file name is
/// reduced to its last path component, its extension must be one of
/// jpg/jpeg/png, and the bytes are stored verbatim under the input directory.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<UpscaleJob>>)> {
    let mut file_data: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("The 'file' field must carry a file name".into()))?;
        let data = field.bytes().await.map_err(multipart_error)?;
        file_data = Some((filename, data.to_vec()));
    }

    let (raw_name, data) =
        file_data.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    let file_name = naming::validate_upload_name(&raw_name)?;
    let id = new_job_id();
    let input_path = state.storage.save_upload(id, &file_name, &data).await?;
    let output_path = state.storage.output_path(id, &file_name);

    let job = UpscaleJob::new(id, file_name, input_path, output_path, &data);
    tracing::info!(
        job_id = %job.id,
        file_name = %job.file_name,
        size = job.input_size,
        "Image uploaded"
    );
    state.jobs.insert(job.clone()).await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: job })))
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs
pub async fn list_jobs(State(state): State<AppState>) -> Json<DataResponse<Vec<UpscaleJob>>> {
    Json(DataResponse {
        data: state.jobs.list().await,
    })
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> AppResult<Json<DataResponse<UpscaleJob>>> {
    let job = state.jobs.get(id).await?;
    Ok(Json(DataResponse { data: job }))
}

/// GET /api/v1/jobs/{id}/input
///
/// Serves the uploaded image as stored.
pub async fn get_input(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let job = state.jobs.get(id).await?;
    let bytes = state.storage.read_input(&job.input_path).await?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, input_content_type(&job.file_name)),
            (CACHE_CONTROL, "no-store"),
        ],
        bytes,
    ))
}

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/{id}/upscale
///
/// Runs the external upscaler for this job and waits for it. On success the
/// job is `ready` and carries the decoded result's description; on failure
/// the job is `failed` and the error is returned.
///
/// The run happens on its own task so that a client disconnect or request
/// timeout cannot leave the job stuck in `processing`.
pub async fn upscale(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> AppResult<Json<DataResponse<UpscaleJob>>> {
    let job = state.jobs.begin_processing(id).await?;
    tracing::info!(job_id = %id, "Processing started");

    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        let outcome = workflow::run_upscale(
            &task_state.storage,
            task_state.upscaler.as_ref(),
            &job,
        )
        .await;

        match outcome {
            Ok(result) => task_state.jobs.complete(id, result).await.map_err(AppError::from),
            Err(err) => {
                if let Err(e) = task_state.jobs.fail(id, err.to_string()).await {
                    tracing::error!(job_id = %id, error = %e, "Failed to record processing failure");
                }
                Err(AppError::from(err))
            }
        }
    });

    let job = handle
        .await
        .map_err(|e| AppError::InternalError(format!("upscale task failed: {e}")))??;

    Ok(Json(DataResponse { data: job }))
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs/{id}/result
///
/// Serves the bytes on disk at the job's output path at the moment of the
/// request. Downloads are named `upscaled_<base>.png`; `?inline=true` serves
/// the same bytes for display instead.
pub async fn get_result(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
    Query(query): Query<ResultQuery>,
) -> AppResult<impl IntoResponse> {
    let job = state.jobs.get(id).await?;
    let bytes = state.storage.read_result(&job.output_path).await?;

    let disposition = if query.inline {
        "inline".to_string()
    } else {
        attachment_disposition(&job.download_name())
    };

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "image/png".to_string()),
            (CONTENT_DISPOSITION, disposition),
            (ETAG, etag_for(&bytes)),
            (CACHE_CONTROL, "no-store".to_string()),
        ],
        bytes,
    ))
}

/// DELETE /api/v1/jobs/{id}/result
///
/// Removes the result file. Deleting an already-absent result returns 404
/// `RESULT_NOT_FOUND`; the job itself is kept either way.
pub async fn delete_result(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> AppResult<Json<DataResponse<UpscaleJob>>> {
    let job = state.jobs.get(id).await?;
    job.ensure_deletable()?;

    match state.storage.delete_result(&job.output_path).await {
        Ok(()) => {}
        Err(err @ StorageError::ResultNotFound { .. }) => {
            // Gone already; make the job agree with the disk before reporting.
            state.jobs.result_deleted(id).await?;
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    }

    let job = state.jobs.result_deleted(id).await?;
    tracing::info!(job_id = %id, "Upscaled image removed from the server");
    Ok(Json(DataResponse { data: job }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

fn input_content_type(file_name: &str) -> &'static str {
    match naming::extension(file_name).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// `attachment` disposition with a header-safe quoted file name.
///
/// Characters that cannot appear in a quoted-string header value are
/// replaced with `_`.
fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_quotes_plain_names() {
        assert_eq!(
            attachment_disposition("upscaled_cat.png"),
            "attachment; filename=\"upscaled_cat.png\""
        );
    }

    #[test]
    fn disposition_replaces_unsafe_characters() {
        assert_eq!(
            attachment_disposition("upscaled_ca\"t é.png"),
            "attachment; filename=\"upscaled_ca_t _.png\""
        );
    }

    #[test]
    fn input_content_type_follows_extension() {
        assert_eq!(input_content_type("cat.JPG"), "image/jpeg");
        assert_eq!(input_content_type("cat.png"), "image/png");
        assert_eq!(input_content_type("cat"), "application/octet-stream");
    }
}
