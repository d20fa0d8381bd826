//! Child process execution with output capture and an optional timeout.
//!
//! [`run_command`] is the only place that spawns the upscaler. Callers set
//! program, arguments, environment and working directory on the
//! [`Command`]; stdio wiring, waiting and killing on timeout happen here.

use std::io;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::invoker::{UpscaleError, UpscaleOutput};

/// Maximum stdout or stderr size captured per stream (1 MiB).
///
/// Model runners can be extremely chatty (progress bars per tile). Output
/// beyond this is still read from the pipe so the child never blocks or
/// gets SIGPIPE, but it is not kept.
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Spawn `cmd`, capture stdout/stderr, and wait for it to exit.
///
/// A non-zero exit is *not* an error here; the returned [`UpscaleOutput`]
/// carries the exit code. Spawn failures are classified into
/// [`UpscaleError::NotFound`] and [`UpscaleError::PermissionDenied`].
pub async fn run_command(
    cmd: &mut Command,
    timeout: Option<Duration>,
) -> Result<UpscaleOutput, UpscaleError> {
    // `kill_on_drop(true)` makes dropping the child on timeout kill it.
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => UpscaleError::NotFound(program.clone()),
        io::ErrorKind::PermissionDenied => UpscaleError::PermissionDenied(program.clone()),
        _ => UpscaleError::Io(e),
    })?;

    // Read the pipes in their own tasks so `child.wait()` can borrow `child`.
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();
    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    let status = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(result) => result?,
            Err(_elapsed) => {
                // `child` is dropped on return, which kills the process.
                return Err(UpscaleError::Timeout {
                    elapsed_ms: start.elapsed().as_millis() as u64,
                });
            }
        },
        None => child.wait().await?,
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    let stdout_bytes = stdout_task.await.unwrap_or_default();
    let stderr_bytes = stderr_task.await.unwrap_or_default();

    Ok(UpscaleOutput {
        stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
        exit_code: status.code().unwrap_or(-1),
        duration_ms,
    })
}

/// Read an output stream to EOF, keeping the first [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
        // Keep the pipe open until the child closes it.
        let _ = tokio::io::copy(&mut h, &mut tokio::io::sink()).await;
    }
    buf
}
