//! The [`Upscaler`] trait and its request/response/error types.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use crate::types::JobId;

/// Everything the upscaler is told about one job.
///
/// These values are exported to the child as environment variables and may
/// also be substituted into its arguments (see [`super::UpscaleCommand`]).
#[derive(Debug, Clone)]
pub struct UpscaleRequest {
    pub job_id: JobId,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl UpscaleRequest {
    /// Environment variables describing this job.
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            ("UPSCALE_JOB_ID", self.job_id.to_string()),
            ("UPSCALE_INPUT_PATH", self.input_path.to_string_lossy().into_owned()),
            ("UPSCALE_OUTPUT_PATH", self.output_path.to_string_lossy().into_owned()),
            ("UPSCALE_INPUT_DIR", self.input_dir.to_string_lossy().into_owned()),
            ("UPSCALE_OUTPUT_DIR", self.output_dir.to_string_lossy().into_owned()),
        ]
    }
}

/// Captured output from a finished upscaler run.
#[derive(Debug, Clone, Serialize)]
pub struct UpscaleOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code (`-1` if killed by a signal).
    pub exit_code: i32,
    pub duration_ms: u64,
}

impl UpscaleOutput {
    /// The text worth showing a user when the run failed: stderr, or stdout
    /// when the program wrote nothing to stderr.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UpscaleError {
    #[error("upscaler executable not found: {0}")]
    NotFound(String),

    #[error("permission denied launching upscaler: {0}")]
    PermissionDenied(String),

    #[error("upscaler timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("upscaler failed with exit code {exit_code}: {diagnostic}")]
    ExecutionFailed { exit_code: i32, diagnostic: String },

    #[error("I/O error running upscaler: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the external upscaler for one job and waits for it to finish.
///
/// Success means the program exited with status zero. Whether it actually
/// produced the expected file is checked separately by the caller.
#[async_trait]
pub trait Upscaler: Send + Sync {
    async fn upscale(&self, request: &UpscaleRequest) -> Result<UpscaleOutput, UpscaleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(stdout: &str, stderr: &str) -> UpscaleOutput {
        UpscaleOutput {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code: 1,
            duration_ms: 3,
        }
    }

    #[test]
    fn diagnostic_prefers_stderr() {
        assert_eq!(output("progress", "  CUDA out of memory\n").diagnostic(), "CUDA out of memory");
        assert_eq!(output("no model weights\n", "").diagnostic(), "no model weights");
    }

    #[test]
    fn display_execution_failed() {
        let err = UpscaleError::ExecutionFailed {
            exit_code: 2,
            diagnostic: "bad input".into(),
        };
        assert_eq!(err.to_string(), "upscaler failed with exit code 2: bad input");
    }

    #[test]
    fn display_timeout() {
        let err = UpscaleError::Timeout { elapsed_ms: 1500 };
        assert_eq!(err.to_string(), "upscaler timed out after 1500ms");
    }

    #[test]
    fn env_vars_cover_job_paths() {
        let dir = std::path::Path::new("/srv");
        let request = crate::upscaler::test_helpers::request(dir);
        let vars = request.env_vars();
        let get = |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        assert_eq!(get("UPSCALE_JOB_ID"), request.job_id.to_string());
        assert!(get("UPSCALE_OUTPUT_PATH").ends_with("cat.png"));
        assert!(get("UPSCALE_INPUT_DIR").ends_with("LR"));
    }
}
