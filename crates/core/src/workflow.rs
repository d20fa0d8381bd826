//! One processing pass for a job: invoke, locate, inspect.
//!
//! The sequence is fixed:
//!
//! 1. make sure the job's output directory exists,
//! 2. remove any file already sitting at the output path, so a result from an
//!    earlier run can never be reported for this one,
//! 3. run the upscaler and wait for it,
//! 4. check exactly once that the output path exists,
//! 5. read and fully decode it.
//!
//! Each step fails with its own [`WorkflowError`] variant so callers can tell
//! a crashed upscaler from a missing or undecodable result.

use crate::hashing::sha256_hex;
use crate::image_info::{self, DecodeError};
use crate::job::{ResultInfo, UpscaleJob};
use crate::storage::{JobStorage, StorageError};
use crate::upscaler::{UpscaleError, UpscaleRequest, Upscaler};

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Upscale(#[from] UpscaleError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Build the request the upscaler receives for `job`.
pub fn request_for(storage: &JobStorage, job: &UpscaleJob) -> UpscaleRequest {
    UpscaleRequest {
        job_id: job.id,
        input_path: job.input_path.clone(),
        output_path: job.output_path.clone(),
        input_dir: storage.job_input_dir(job.id),
        output_dir: storage.job_output_dir(job.id),
    }
}

/// Run the upscaler for `job` and describe the result it produced.
pub async fn run_upscale(
    storage: &JobStorage,
    upscaler: &dyn Upscaler,
    job: &UpscaleJob,
) -> Result<ResultInfo, WorkflowError> {
    let request = request_for(storage, job);

    storage.prepare_output_dir(job.id).await?;
    storage.clear_stale_result(&job.output_path).await?;

    upscaler.upscale(&request).await?;

    storage.locate_result(&job.output_path).await?;
    let bytes = storage.read_result(&job.output_path).await?;
    let result = inspect_result(bytes).await?;

    tracing::info!(
        job_id = %job.id,
        width = result.image.width,
        height = result.image.height,
        size_bytes = result.size_bytes,
        "Upscaled result ready"
    );
    Ok(result)
}

/// Decode result bytes on the blocking pool and fingerprint them.
pub async fn inspect_result(bytes: Vec<u8>) -> Result<ResultInfo, WorkflowError> {
    let size_bytes = bytes.len() as u64;
    let digest = sha256_hex(&bytes);

    let image = tokio::task::spawn_blocking(move || image_info::inspect(&bytes))
        .await
        .map_err(|e| WorkflowError::Internal(format!("image decode task failed: {e}")))??;

    Ok(ResultInfo {
        image,
        size_bytes,
        digest,
    })
}
