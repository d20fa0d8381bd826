//! [`Upscaler`] backed by a real child process.

use async_trait::async_trait;
use tokio::process::Command;

use super::command::UpscaleCommand;
use super::invoker::{UpscaleError, UpscaleOutput, UpscaleRequest, Upscaler};
use super::subprocess;

/// Launches the configured [`UpscaleCommand`] once per job.
pub struct ProcessUpscaler {
    command: UpscaleCommand,
}

impl ProcessUpscaler {
    pub fn new(command: UpscaleCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Upscaler for ProcessUpscaler {
    async fn upscale(&self, request: &UpscaleRequest) -> Result<UpscaleOutput, UpscaleError> {
        let mut cmd = Command::new(&self.command.program);
        cmd.args(self.command.expand_args(request));
        for (key, value) in request.env_vars() {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.command.working_directory {
            cmd.current_dir(dir);
        }

        tracing::info!(
            job_id = %request.job_id,
            command = %self.command.display(),
            "Launching upscaler"
        );

        let output = subprocess::run_command(&mut cmd, self.command.timeout).await?;

        if output.exit_code != 0 {
            tracing::warn!(
                job_id = %request.job_id,
                exit_code = output.exit_code,
                duration_ms = output.duration_ms,
                "Upscaler exited with failure"
            );
            return Err(UpscaleError::ExecutionFailed {
                exit_code: output.exit_code,
                diagnostic: output.diagnostic(),
            });
        }

        tracing::info!(
            job_id = %request.job_id,
            duration_ms = output.duration_ms,
            "Upscaler finished"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::upscaler::test_helpers::{request, sh};

    #[tokio::test]
    async fn job_paths_are_exported_to_the_child() {
        let dir = tempfile::tempdir().expect("tempdir");
        let req = request(dir.path());
        let upscaler = ProcessUpscaler::new(sh(
            r#"echo "$UPSCALE_JOB_ID|$UPSCALE_INPUT_PATH|$UPSCALE_OUTPUT_PATH""#,
        ));

        let output = upscaler.upscale(&req).await.expect("upscale");

        let expected = format!(
            "{}|{}|{}",
            req.job_id,
            req.input_path.display(),
            req.output_path.display()
        );
        assert_eq!(output.stdout.trim(), expected);
    }

    #[tokio::test]
    async fn placeholders_reach_the_child_as_arguments() {
        let dir = tempfile::tempdir().expect("tempdir");
        let req = request(dir.path());
        let upscaler = ProcessUpscaler::new(UpscaleCommand::new(
            "echo",
            vec!["{job_id}".into(), "{output}".into()],
        ));

        let output = upscaler.upscale(&req).await.expect("upscale");
        assert_eq!(
            output.stdout.trim(),
            format!("{} {}", req.job_id, req.output_path.display())
        );
    }

    #[tokio::test]
    async fn non_zero_exit_is_execution_failed_with_stderr() {
        let dir = tempfile::tempdir().expect("tempdir");
        let upscaler = ProcessUpscaler::new(sh("echo 'model weights missing' >&2; exit 7"));

        let err = upscaler.upscale(&request(dir.path())).await.unwrap_err();
        assert_matches!(err, UpscaleError::ExecutionFailed { exit_code: 7, diagnostic } => {
            assert_eq!(diagnostic, "model weights missing");
        });
    }

    #[tokio::test]
    async fn working_directory_is_applied() {
        let dir = tempfile::tempdir().expect("tempdir");
        let upscaler = ProcessUpscaler::new(
            sh("pwd").with_working_directory(Some(dir.path().to_path_buf())),
        );

        let output = upscaler.upscale(&request(dir.path())).await.expect("upscale");
        let expected = dir.path().canonicalize().expect("canonicalize");
        assert_eq!(
            std::path::Path::new(output.stdout.trim())
                .canonicalize()
                .expect("canonicalize pwd"),
            expected
        );
    }
}
