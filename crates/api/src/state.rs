use std::sync::Arc;

use upscale_core::storage::JobStorage;
use upscale_core::upscaler::{ProcessUpscaler, Upscaler};

use crate::config::ServerConfig;
use crate::registry::JobRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Path resolution and file I/O for uploads and results.
    pub storage: Arc<JobStorage>,
    /// The external upscaler.
    pub upscaler: Arc<dyn Upscaler>,
    /// Jobs known to this process.
    pub jobs: Arc<JobRegistry>,
}

impl AppState {
    /// Build state with an explicit upscaler implementation.
    pub fn new(config: ServerConfig, upscaler: Arc<dyn Upscaler>) -> Self {
        let storage = JobStorage::new(
            config.upscale.input_dir.clone(),
            config.upscale.output_dir.clone(),
            config.upscale.layout,
        );
        Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
            upscaler,
            jobs: Arc::new(JobRegistry::new()),
        }
    }

    /// Build state that launches the configured command as a child process.
    pub fn from_config(config: ServerConfig) -> Self {
        let upscaler = Arc::new(ProcessUpscaler::new(config.upscale.command.clone()));
        Self::new(config, upscaler)
    }
}
