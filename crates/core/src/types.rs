/// Every upscale job is keyed by a time-ordered UUID (v7).
pub type JobId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh job key.
pub fn new_job_id() -> JobId {
    uuid::Uuid::now_v7()
}
