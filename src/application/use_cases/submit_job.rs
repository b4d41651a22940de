use crate::application::dto::JobRequest;
use crate::application::job_scheduler::JobScheduler;
use crate::ports::inbound::{JobOutcome, PipelinePort};
use crate::ports::outbound::{StatusRepository, TrackingService};
use crate::sbom_generation::domain::{ExternalProjectId, Job, JobId};
use crate::shared::error::PipelineError;
use crate::shared::security::validate_regular_file;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A job that has been handed to the scheduler.
#[derive(Debug)]
pub struct SubmittedJob {
    pub job_id: JobId,
    pub external_id: ExternalProjectId,
    pub handle: JoinHandle<JobOutcome>,
}

/// SubmitJobUseCase - Accepts an uploaded archive and schedules its pipeline
///
/// Nothing is created remotely or on disk until the request has passed
/// validation. The remote project is named with a fresh random hex id that
/// also serves as the job id and the extraction directory name.
pub struct SubmitJobUseCase<T, P, S> {
    tracking: T,
    scheduler: JobScheduler<P, S>,
    storage_root: PathBuf,
}

impl<T, P, S> SubmitJobUseCase<T, P, S>
where
    T: TrackingService,
    P: PipelinePort + 'static,
    S: StatusRepository + Clone + 'static,
{
    pub fn new(tracking: T, scheduler: JobScheduler<P, S>, storage_root: PathBuf) -> Self {
        Self {
            tracking,
            scheduler,
            storage_root,
        }
    }

    /// Validates and stages the request, then starts its pipeline.
    ///
    /// # Errors
    /// `UnsupportedEcosystem` or `InvalidRequest` for a bad request,
    /// `RemoteCallFailed` if the remote project cannot be created, `Io` if
    /// the archive cannot be staged.
    pub async fn execute(&self, request: JobRequest) -> Result<SubmittedJob, PipelineError> {
        let job = self.prepare(request).await?;
        let job_id = job.id().clone();
        let external_id = job.external_id().clone();
        Ok(SubmittedJob {
            job_id,
            external_id,
            handle: self.scheduler.submit(job),
        })
    }

    /// Everything up to, but not including, scheduling.
    pub async fn prepare(&self, request: JobRequest) -> Result<Job, PipelineError> {
        let ecosystem = request.parsed_ecosystem()?;
        let base_name = request.base_name()?;
        validate_regular_file(&request.archive_path, "Uploaded archive").map_err(|e| {
            PipelineError::InvalidRequest {
                reason: e.to_string(),
                hint: "pass the path of an existing archive file".to_string(),
            }
        })?;

        let job_id = JobId::generate();
        let external_id = self.tracking.create_project(job_id.as_str()).await?;
        info!(job_id = %job_id, project = %external_id, "remote project created");

        let staged = self.storage_root.join(format!("{}_{}", job_id, base_name));
        if let Err(e) = stage_archive(&request.archive_path, &self.storage_root, &staged).await {
            if let Err(cleanup) = self.tracking.delete_project(&external_id).await {
                warn!(project = %external_id, error = %cleanup, "could not roll back remote project");
            }
            return Err(e);
        }

        Ok(Job::new(
            job_id.clone(),
            external_id,
            staged,
            self.storage_root.join(job_id.as_str()),
            ecosystem,
            request.root_hint(),
        ))
    }
}

async fn stage_archive(source: &Path, storage_root: &Path, staged: &Path) -> Result<(), PipelineError> {
    tokio::fs::create_dir_all(storage_root)
        .await
        .map_err(|e| PipelineError::io(storage_root, e))?;
    tokio::fs::copy(source, staged)
        .await
        .map_err(|e| PipelineError::io(staged, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::persistence::InMemoryStatusStore;
    use crate::sbom_generation::domain::{Ecosystem, ExternalProjectId, JobStatus};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeTracking {
        created: Mutex<Vec<String>>,
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl TrackingService for FakeTracking {
        async fn create_project(&self, name: &str) -> Result<ExternalProjectId, PipelineError> {
            self.created.lock().unwrap().push(name.to_string());
            Ok(ExternalProjectId::new("remote-uuid").unwrap())
        }

        async fn delete_project(&self, _id: &ExternalProjectId) -> Result<(), PipelineError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn upload_bom(&self, _artifact: &Path, _id: &ExternalProjectId) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    struct EchoPipeline;

    #[async_trait]
    impl PipelinePort for EchoPipeline {
        async fn run(&self, job: Job) -> JobOutcome {
            JobOutcome {
                job_id: job.id().clone(),
                status: JobStatus::Complete,
                error_message: None,
                error_kind: None,
                artifact: Some(job.archive_path().to_path_buf()),
                duration: Duration::ZERO,
            }
        }
    }

    fn use_case(storage: &Path) -> SubmitJobUseCase<FakeTracking, EchoPipeline, InMemoryStatusStore> {
        let scheduler = JobScheduler::new(Arc::new(EchoPipeline), InMemoryStatusStore::new());
        SubmitJobUseCase::new(FakeTracking::default(), scheduler, storage.to_path_buf())
    }

    #[tokio::test]
    async fn test_prepare_stages_archive() {
        let upload = TempDir::new().unwrap();
        let storage = TempDir::new().unwrap();
        let source = upload.path().join("tmp-upload");
        fs::write(&source, b"PK\x03\x04").unwrap();
        let submit = use_case(storage.path());

        let job = submit
            .prepare(JobRequest::new(source.clone(), "shop-api.tar.gz", "PHP"))
            .await
            .unwrap();

        assert_eq!(job.ecosystem(), Ecosystem::Php);
        assert_eq!(job.root_hint(), Some("shop-api"));
        assert_eq!(job.external_id().as_str(), "remote-uuid");
        assert_eq!(job.extraction_dir(), storage.path().join(job.id().as_str()));
        assert!(job.archive_path().starts_with(storage.path()));
        assert!(job.archive_path().exists());
        assert!(source.exists());

        let created = submit.tracking.created.lock().unwrap().clone();
        assert_eq!(created, vec![job.id().to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_request_touches_nothing() {
        let storage = TempDir::new().unwrap();
        let submit = use_case(storage.path());

        let err = submit
            .prepare(JobRequest::new(PathBuf::from("/tmp/x"), "x.zip", "cobol"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "UnsupportedEcosystem");

        let err = submit
            .prepare(JobRequest::new(PathBuf::from("/nonexistent/x.zip"), "x.zip", "go"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidRequest");

        assert!(submit.tracking.created.lock().unwrap().is_empty());
        assert_eq!(fs::read_dir(storage.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_execute_schedules_job() {
        let upload = TempDir::new().unwrap();
        let storage = TempDir::new().unwrap();
        let source = upload.path().join("app.zip");
        fs::write(&source, b"PK\x03\x04").unwrap();
        let submit = use_case(storage.path());

        let submitted = submit
            .execute(JobRequest::from_path(source, "rust"))
            .await
            .unwrap();
        assert_eq!(submitted.external_id.as_str(), "remote-uuid");
        let outcome = submitted.handle.await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.job_id, submitted.job_id);
        assert_eq!(submit.tracking.deletes.load(Ordering::SeqCst), 0);
    }
}
