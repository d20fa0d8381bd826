use std::path::PathBuf;
use std::time::Duration;

use upscale_core::storage::StorageLayout;
use upscale_core::upscaler::UpscaleCommand;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for running next to an upscaler
/// checkout (`python test.py` reading `LR/` and writing `results/`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `900`). Must exceed the
    /// upscaler timeout or long runs are cut off at the HTTP layer.
    pub request_timeout_secs: u64,
    /// Largest accepted upload body in bytes (default: 25 MiB).
    pub max_upload_bytes: usize,
    /// Where uploads and results live and how the upscaler is launched.
    pub upscale: UpscaleConfig,
}

/// Storage layout and external command settings.
#[derive(Debug, Clone)]
pub struct UpscaleConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub layout: StorageLayout,
    pub command: UpscaleCommand,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `900`                      |
    /// | `MAX_UPLOAD_BYTES`     | `26214400`                 |
    ///
    /// See [`UpscaleConfig::from_env`] for the `UPSCALE_*` variables.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (25 * 1024 * 1024).to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            upscale: UpscaleConfig::from_env(),
        }
    }
}

impl UpscaleConfig {
    /// | Env Var                | Default           |
    /// |------------------------|-------------------|
    /// | `UPSCALE_INPUT_DIR`    | `LR`              |
    /// | `UPSCALE_OUTPUT_DIR`   | `results`         |
    /// | `UPSCALE_LAYOUT`       | `shared`          |
    /// | `UPSCALE_COMMAND`      | `python test.py`  |
    /// | `UPSCALE_WORKDIR`      | (inherit)         |
    /// | `UPSCALE_TIMEOUT_SECS` | `600` (`0` = none)|
    ///
    /// Paths handed to the child are resolved against the server's working
    /// directory, so use absolute directories together with `UPSCALE_WORKDIR`.
    pub fn from_env() -> Self {
        let input_dir = std::env::var("UPSCALE_INPUT_DIR").unwrap_or_else(|_| "LR".into());
        let output_dir = std::env::var("UPSCALE_OUTPUT_DIR").unwrap_or_else(|_| "results".into());

        let layout = StorageLayout::from_name(
            &std::env::var("UPSCALE_LAYOUT")
                .unwrap_or_else(|_| StorageLayout::default().name().into()),
        )
        .unwrap_or_else(|e| panic!("UPSCALE_LAYOUT: {e}"));

        let timeout_secs: u64 = std::env::var("UPSCALE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("UPSCALE_TIMEOUT_SECS must be a valid u64");
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let working_directory = std::env::var("UPSCALE_WORKDIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let command = UpscaleCommand::parse(
            &std::env::var("UPSCALE_COMMAND").unwrap_or_else(|_| "python test.py".into()),
        )
        .unwrap_or_else(|e| panic!("UPSCALE_COMMAND: {e}"))
        .with_timeout(timeout)
        .with_working_directory(working_directory);

        Self {
            input_dir: PathBuf::from(input_dir),
            output_dir: PathBuf::from(output_dir),
            layout,
            command,
        }
    }
}
