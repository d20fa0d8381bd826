//! The upload -> process -> result lifecycle of a single image.
//!
//! A job is created when an upload has been written to disk and lives only
//! in memory. Its phase moves only through the transitions below; anything
//! else is a [`CoreError::Conflict`].
//!
//! ```text
//! uploaded --begin_processing--> processing --complete--> ready
//!                                     |                     |
//!                                     +-------fail------> failed
//! ready --result_deleted--> uploaded
//! ready | failed --begin_processing--> processing
//! ```

use std::path::PathBuf;

use serde::Serialize;

use crate::error::CoreError;
use crate::hashing::sha256_hex;
use crate::image_info::ImageInfo;
use crate::naming;
use crate::types::{JobId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// Input saved, no result reported yet.
    Uploaded,
    /// The external upscaler is running for this job.
    Processing,
    /// A decodable result exists at the output path.
    Ready,
    /// The last processing attempt failed; see `last_error`.
    Failed,
}

impl JobPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

/// What was found at the output path after a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultInfo {
    #[serde(flatten)]
    pub image: ImageInfo,
    pub size_bytes: u64,
    /// SHA-256 of the result bytes at the time they were inspected.
    pub digest: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpscaleJob {
    pub id: JobId,
    /// Sanitized name the upload was stored under.
    pub file_name: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub input_size: u64,
    pub input_digest: String,
    pub phase: JobPhase,
    pub result: Option<ResultInfo>,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UpscaleJob {
    /// Create a job for an upload that has already been written to `input_path`.
    pub fn new(
        id: JobId,
        file_name: String,
        input_path: PathBuf,
        output_path: PathBuf,
        input: &[u8],
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            file_name,
            input_path,
            output_path,
            input_size: input.len() as u64,
            input_digest: sha256_hex(input),
            phase: JobPhase::Uploaded,
            result: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name offered when the result is downloaded.
    pub fn download_name(&self) -> String {
        naming::download_file_name(&self.file_name)
    }

    /// Enter `processing`. Any previous result or error is forgotten.
    pub fn begin_processing(&mut self) -> Result<(), CoreError> {
        if self.phase == JobPhase::Processing {
            return Err(CoreError::Conflict(format!(
                "Job {} is already being processed",
                self.id
            )));
        }
        self.phase = JobPhase::Processing;
        self.result = None;
        self.last_error = None;
        self.touch();
        Ok(())
    }

    /// Record a located and decoded result.
    pub fn complete(&mut self, result: ResultInfo) -> Result<(), CoreError> {
        self.require_processing("complete")?;
        self.phase = JobPhase::Ready;
        self.result = Some(result);
        self.touch();
        Ok(())
    }

    /// Record a failed processing attempt.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), CoreError> {
        self.require_processing("fail")?;
        self.phase = JobPhase::Failed;
        self.last_error = Some(error.into());
        self.touch();
        Ok(())
    }

    /// Check that the output file may be deleted in the current phase.
    pub fn ensure_deletable(&self) -> Result<(), CoreError> {
        if self.phase == JobPhase::Processing {
            return Err(CoreError::Conflict(format!(
                "Job {} is being processed; its result cannot be deleted yet",
                self.id
            )));
        }
        Ok(())
    }

    /// The output file was removed from storage.
    pub fn result_deleted(&mut self) {
        if self.phase == JobPhase::Ready {
            self.phase = JobPhase::Uploaded;
        }
        self.result = None;
        self.touch();
    }

    fn require_processing(&self, action: &str) -> Result<(), CoreError> {
        if self.phase != JobPhase::Processing {
            return Err(CoreError::Conflict(format!(
                "Cannot {action} job {} in phase '{}'",
                self.id,
                self.phase.as_str()
            )));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::types::new_job_id;

    fn job() -> UpscaleJob {
        UpscaleJob::new(
            new_job_id(),
            "cat.jpg".into(),
            PathBuf::from("LR/cat.jpg"),
            PathBuf::from("results/cat.png"),
            b"jpeg bytes",
        )
    }

    fn result() -> ResultInfo {
        ResultInfo {
            image: ImageInfo {
                format: "png".into(),
                width: 8,
                height: 8,
            },
            size_bytes: 42,
            digest: "abc".into(),
        }
    }

    #[test]
    fn new_job_is_uploaded() {
        let job = job();
        assert_eq!(job.phase, JobPhase::Uploaded);
        assert_eq!(job.input_size, 10);
        assert_eq!(job.input_digest, sha256_hex(b"jpeg bytes"));
        assert_eq!(job.download_name(), "upscaled_cat.png");
    }

    #[test]
    fn happy_path_reaches_ready() {
        let mut job = job();
        job.begin_processing().unwrap();
        assert_eq!(job.phase, JobPhase::Processing);
        job.complete(result()).unwrap();
        assert_eq!(job.phase, JobPhase::Ready);
        assert_eq!(job.result, Some(result()));
    }

    #[test]
    fn double_processing_is_a_conflict() {
        let mut job = job();
        job.begin_processing().unwrap();
        assert_matches!(job.begin_processing(), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn complete_requires_processing() {
        let mut job = job();
        assert_matches!(job.complete(result()), Err(CoreError::Conflict(_)));
        assert_matches!(job.fail("boom"), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn failure_is_recorded_and_retry_clears_it() {
        let mut job = job();
        job.begin_processing().unwrap();
        job.fail("exit code 1").unwrap();
        assert_eq!(job.phase, JobPhase::Failed);
        assert_eq!(job.last_error.as_deref(), Some("exit code 1"));

        job.begin_processing().unwrap();
        assert_eq!(job.last_error, None);
    }

    #[test]
    fn reprocessing_ready_job_drops_old_result() {
        let mut job = job();
        job.begin_processing().unwrap();
        job.complete(result()).unwrap();
        job.begin_processing().unwrap();
        assert_eq!(job.result, None);
    }

    #[test]
    fn deleting_result_returns_to_uploaded() {
        let mut job = job();
        job.begin_processing().unwrap();
        job.complete(result()).unwrap();
        job.ensure_deletable().unwrap();
        job.result_deleted();
        assert_eq!(job.phase, JobPhase::Uploaded);
        assert_eq!(job.result, None);
    }

    #[test]
    fn cannot_delete_while_processing() {
        let mut job = job();
        job.begin_processing().unwrap();
        assert_matches!(job.ensure_deletable(), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn phase_serializes_snake_case() {
        let json = serde_json::to_value(JobPhase::Processing).unwrap();
        assert_eq!(json, "processing");
    }
}
