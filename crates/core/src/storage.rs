//! On-disk layout of uploads and results.
//!
//! Uploads go under the input directory (`LR/` by default) and the external
//! upscaler writes results under the output directory (`results/`). Two
//! layouts are supported:
//!
//! - [`StorageLayout::Shared`] (default): `LR/<name>` and
//!   `results/<base>.png`, the convention existing upscaler scripts scan
//!   for. Uploads with the same name overwrite each other.
//! - [`StorageLayout::PerJob`]: `LR/<job_id>/<name>` and
//!   `results/<job_id>/<base>.png`, so concurrent or repeated uploads never
//!   collide.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::CoreError;
use crate::naming;
use crate::types::JobId;

/// Layout identifier for the shared, convention-only layout.
pub const LAYOUT_SHARED: &str = "shared";

/// Layout identifier for the per-job layout.
pub const LAYOUT_PER_JOB: &str = "per-job";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageLayout {
    #[default]
    Shared,
    /// Opt-in; the upscaler must read the `UPSCALE_*` paths it is given.
    PerJob,
}

impl StorageLayout {
    /// Parse from configuration (`shared` or `per-job`).
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            LAYOUT_SHARED => Ok(Self::Shared),
            LAYOUT_PER_JOB | "per_job" => Ok(Self::PerJob),
            other => Err(CoreError::Validation(format!(
                "Unknown storage layout '{other}'. Must be one of: {LAYOUT_SHARED}, {LAYOUT_PER_JOB}"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Shared => LAYOUT_SHARED,
            Self::PerJob => LAYOUT_PER_JOB,
        }
    }
}

/// Filesystem failures, one variant per user-visible failure mode.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to store upload at {path:?}: {source}")]
    Upload { path: PathBuf, source: io::Error },

    #[error("failed to prepare output directory {path:?}: {source}")]
    Prepare { path: PathBuf, source: io::Error },

    /// Nothing exists at the expected output path. `listing` holds the
    /// contents of the directory the file was expected in.
    #[error("upscaled image not found at {path:?}")]
    ResultNotFound { path: PathBuf, listing: Vec<String> },

    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to delete {path:?}: {source}")]
    Delete { path: PathBuf, source: io::Error },
}

/// Resolves job paths and performs all file I/O for uploads and results.
#[derive(Debug, Clone)]
pub struct JobStorage {
    input_dir: PathBuf,
    output_dir: PathBuf,
    layout: StorageLayout,
}

impl JobStorage {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        layout: StorageLayout,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            layout,
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn layout(&self) -> StorageLayout {
        self.layout
    }

    /// Directory the upload for `id` is written into.
    pub fn job_input_dir(&self, id: JobId) -> PathBuf {
        match self.layout {
            StorageLayout::Shared => self.input_dir.clone(),
            StorageLayout::PerJob => self.input_dir.join(id.to_string()),
        }
    }

    /// Directory the upscaler is expected to write the result for `id` into.
    pub fn job_output_dir(&self, id: JobId) -> PathBuf {
        match self.layout {
            StorageLayout::Shared => self.output_dir.clone(),
            StorageLayout::PerJob => self.output_dir.join(id.to_string()),
        }
    }

    /// Where an upload named `file_name` is stored.
    ///
    /// `file_name` must already be sanitized (see [`naming::sanitize_file_name`]).
    pub fn input_path(&self, id: JobId, file_name: &str) -> PathBuf {
        self.job_input_dir(id).join(file_name)
    }

    /// Where the result for an upload named `file_name` is expected.
    pub fn output_path(&self, id: JobId, file_name: &str) -> PathBuf {
        self.job_output_dir(id)
            .join(naming::result_file_name(file_name))
    }

    /// Create the top-level input and output directories.
    pub async fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.input_dir).await?;
        fs::create_dir_all(&self.output_dir).await
    }

    /// Write the upload verbatim, creating directories as needed and
    /// overwriting any existing file at the same path.
    pub async fn save_upload(
        &self,
        id: JobId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let path = self.input_path(id, file_name);
        let upload_err = |source| StorageError::Upload {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(self.job_input_dir(id))
            .await
            .map_err(upload_err)?;
        fs::write(&path, bytes).await.map_err(upload_err)?;

        tracing::debug!(job_id = %id, path = %path.display(), size = bytes.len(), "Upload stored");
        Ok(path)
    }

    /// Make sure the directory the upscaler writes into exists.
    pub async fn prepare_output_dir(&self, id: JobId) -> Result<PathBuf, StorageError> {
        let dir = self.job_output_dir(id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| StorageError::Prepare {
                path: dir.clone(),
                source,
            })?;
        Ok(dir)
    }

    /// Remove a leftover result at `path` from an earlier run.
    ///
    /// Returns whether a file was actually removed.
    pub async fn clear_stale_result(&self, path: &Path) -> Result<bool, StorageError> {
        match fs::remove_file(path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Removed stale result before processing");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::Delete {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Check once whether a result exists at `path`.
    pub async fn locate_result(&self, path: &Path) -> Result<(), StorageError> {
        match fs::try_exists(path).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(self.not_found(path).await),
            Err(source) => Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Read the result bytes currently on disk at `path`.
    pub async fn read_result(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(self.not_found(path).await),
            Err(source) => Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Read a stored upload.
    pub async fn read_input(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(path).await.map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Delete the result at `path`. A missing file is reported as
    /// [`StorageError::ResultNotFound`].
    pub async fn delete_result(&self, path: &Path) -> Result<(), StorageError> {
        match fs::remove_file(path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Result deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(self.not_found(path).await),
            Err(source) => Err(StorageError::Delete {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Sorted entry names of the top-level output directory.
    pub async fn list_output_dir(&self) -> Vec<String> {
        list_dir(&self.output_dir).await
    }

    async fn not_found(&self, path: &Path) -> StorageError {
        let dir = path.parent().unwrap_or(&self.output_dir);
        StorageError::ResultNotFound {
            path: path.to_path_buf(),
            listing: list_dir(dir).await,
        }
    }
}

/// Sorted entry names of `dir`; an unreadable or missing directory lists as empty.
pub async fn list_dir(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    let Ok(mut entries) = fs::read_dir(dir).await else {
        return names;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    names
}
