//! In-memory registry of upscale jobs.
//!
//! Jobs exist only for the lifetime of the process: a restart forgets every
//! job while the files on disk stay where they are.

use std::collections::HashMap;

use tokio::sync::RwLock;
use upscale_core::error::CoreError;
use upscale_core::job::{ResultInfo, UpscaleJob};
use upscale_core::types::JobId;

/// Thread-safe job table; designed to be wrapped in `Arc` and shared
/// across the application.
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, UpscaleJob>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a freshly uploaded job, replacing any job with the same id.
    pub async fn insert(&self, job: UpscaleJob) {
        self.jobs.write().await.insert(job.id, job);
    }

    /// Snapshot of a single job.
    pub async fn get(&self, id: JobId) -> Result<UpscaleJob, CoreError> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound {
                entity: "UpscaleJob",
                id,
            })
    }

    /// Snapshots of all jobs, newest first.
    pub async fn list(&self) -> Vec<UpscaleJob> {
        let mut jobs: Vec<_> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Apply a transition to the job under the write lock and return the
    /// updated snapshot.
    pub async fn update<F>(&self, id: JobId, transition: F) -> Result<UpscaleJob, CoreError>
    where
        F: FnOnce(&mut UpscaleJob) -> Result<(), CoreError>,
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(CoreError::NotFound {
            entity: "UpscaleJob",
            id,
        })?;
        transition(job)?;
        Ok(job.clone())
    }

    pub async fn begin_processing(&self, id: JobId) -> Result<UpscaleJob, CoreError> {
        self.update(id, UpscaleJob::begin_processing).await
    }

    pub async fn complete(&self, id: JobId, result: ResultInfo) -> Result<UpscaleJob, CoreError> {
        self.update(id, |job| job.complete(result)).await
    }

    pub async fn fail(&self, id: JobId, error: String) -> Result<UpscaleJob, CoreError> {
        self.update(id, |job| job.fail(error)).await
    }

    pub async fn result_deleted(&self, id: JobId) -> Result<UpscaleJob, CoreError> {
        self.update(id, |job| {
            job.result_deleted();
            Ok(())
        })
        .await
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
