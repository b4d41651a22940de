use crate::ports::outbound::{StatusRepository, TrackingService};
use crate::sbom_generation::domain::{ExternalProjectId, JobId};
use crate::shared::Result;
use anyhow::Context;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::info;

/// DeleteProjectUseCase - Removes a project remotely, then locally
///
/// The remote deletion must succeed (an already missing project counts as
/// deleted) before any local state is touched. If it fails, the error is
/// returned and the extraction directory and status record are kept.
pub struct DeleteProjectUseCase<T, S> {
    tracking: T,
    statuses: S,
    storage_root: PathBuf,
}

impl<T, S> DeleteProjectUseCase<T, S>
where
    T: TrackingService,
    S: StatusRepository,
{
    pub fn new(tracking: T, statuses: S, storage_root: PathBuf) -> Self {
        Self {
            tracking,
            statuses,
            storage_root,
        }
    }

    /// Deletes the remote project and, when `job_id` is given, the job's
    /// extraction directory and status record.
    pub async fn execute(&self, external_id: &ExternalProjectId, job_id: Option<&JobId>) -> Result<()> {
        self.tracking.delete_project(external_id).await?;
        info!(project = %external_id, "remote project deleted");

        let Some(job_id) = job_id else {
            return Ok(());
        };

        let dir = self.storage_root.join(job_id.as_str());
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => info!(dir = %dir.display(), "extraction directory removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to remove extraction directory: {}", dir.display()))
            }
        }

        self.statuses.remove(job_id).await
    }
}
