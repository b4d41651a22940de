use crate::sbom_generation::domain::{JobId, JobStatus, StatusRecord};
use crate::shared::Result;
use async_trait::async_trait;

/// StatusRepository port for persisting job status
///
/// The pipeline calls `update_status` after every stage transition.
/// Implementations must reject writes that reverse progress or leave a
/// terminal state; a write for an unknown job creates its record.
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Records `status` for `job_id`, replacing the previous message.
    ///
    /// # Errors
    /// Returns an error if the transition is not allowed or the record
    /// cannot be persisted.
    async fn update_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        error_message: Option<String>,
    ) -> Result<()>;

    /// Current record, if the job is known.
    async fn get_status(&self, job_id: &JobId) -> Result<Option<StatusRecord>>;

    /// Forgets the job. Removing an unknown job is not an error.
    async fn remove(&self, job_id: &JobId) -> Result<()>;
}

/// Checks a status change against the lifecycle rules.
///
/// `current` is `None` for a job with no record yet, which accepts any
/// status.
pub fn ensure_transition(job_id: &JobId, current: Option<JobStatus>, next: JobStatus) -> Result<()> {
    match current {
        Some(current) if !current.can_transition_to(next) => anyhow::bail!(
            "Rejected status change for job {}: {} -> {}",
            job_id,
            current,
            next
        ),
        _ => Ok(()),
    }
}
