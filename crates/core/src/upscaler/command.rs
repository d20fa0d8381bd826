//! Configured upscaler command line and per-job argument expansion.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

use super::invoker::UpscaleRequest;

/// Placeholders recognised inside command arguments.
pub const PLACEHOLDERS: &[&str] = &["{job_id}", "{input}", "{output}", "{input_dir}", "{output_dir}"];

/// Default wall-clock limit for one upscaler run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// The external program to launch for every job.
///
/// Arguments may contain [`PLACEHOLDERS`]; a command without any behaves like
/// a plain no-argument invocation and must discover its input from the input
/// directory (or from the `UPSCALE_*` environment variables).
#[derive(Debug, Clone)]
pub struct UpscaleCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the child (inherits ours if `None`).
    pub working_directory: Option<PathBuf>,
    /// Kill the child after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl UpscaleCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_directory: None,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Parse a whitespace-separated command line such as `python test.py`.
    pub fn parse(command_line: &str) -> Result<Self, CoreError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| CoreError::Validation("Upscale command must not be empty".into()))?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_working_directory(mut self, dir: Option<PathBuf>) -> Self {
        self.working_directory = dir;
        self
    }

    /// Arguments for `request` with every placeholder substituted.
    pub fn expand_args(&self, request: &UpscaleRequest) -> Vec<String> {
        let job_id = request.job_id.to_string();
        let input = request.input_path.to_string_lossy();
        let output = request.output_path.to_string_lossy();
        let input_dir = request.input_dir.to_string_lossy();
        let output_dir = request.output_dir.to_string_lossy();

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{input_dir}", &input_dir)
                    .replace("{output_dir}", &output_dir)
                    .replace("{job_id}", &job_id)
                    .replace("{input}", &input)
                    .replace("{output}", &output)
            })
            .collect()
    }

    /// Human-readable form for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
