use crate::ports::inbound::{JobOutcome, PipelinePort};
use crate::ports::outbound::{ProcessRunner, StatusRepository, TrackingService};
use crate::sbom_generation::domain::{Job, JobId, JobStatus};
use crate::sbom_generation::services::{ArchiveExtractor, CommandRegistry, ProjectRootLocator};
use crate::shared::error::PipelineError;
use crate::shared::security::ensure_dir_within;
use crate::shared::text::truncate_message;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn, Instrument};

/// Default wall-clock budget for one generator run.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(600);

/// How hard the pipeline tries to persist a status change.
///
/// A write that still fails after every attempt is logged and the pipeline
/// carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWritePolicy {
    pub attempts: u32,
    pub timeout: Duration,
}

impl Default for StatusWritePolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            timeout: Duration::from_secs(5),
        }
    }
}

/// RunPipelineUseCase - Drives one job through extract, generate and upload
///
/// Every stage transition is written to the status repository before the
/// next stage starts. The first failing stage ends the run with a `Failed`
/// status carrying the truncated error text; later stages never run.
///
/// # Type Parameters
/// * `S` - StatusRepository implementation
/// * `T` - TrackingService implementation
/// * `P` - ProcessRunner implementation
pub struct RunPipelineUseCase<S, T, P> {
    statuses: S,
    tracking: T,
    runner: P,
    extractor: ArchiveExtractor,
    locator: ProjectRootLocator,
    registry: CommandRegistry,
    generation_timeout: Duration,
    status_policy: StatusWritePolicy,
}

impl<S, T, P> RunPipelineUseCase<S, T, P>
where
    S: StatusRepository,
    T: TrackingService,
    P: ProcessRunner,
{
    pub fn new(
        statuses: S,
        tracking: T,
        runner: P,
        extractor: ArchiveExtractor,
        registry: CommandRegistry,
    ) -> Self {
        Self {
            statuses,
            tracking,
            runner,
            extractor,
            locator: ProjectRootLocator::default(),
            registry,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            status_policy: StatusWritePolicy::default(),
        }
    }

    pub fn with_locator(mut self, locator: ProjectRootLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn with_status_policy(mut self, policy: StatusWritePolicy) -> Self {
        self.status_policy = policy;
        self
    }

    pub fn statuses(&self) -> &S {
        &self.statuses
    }

    async fn execute(&self, job: Job) -> JobOutcome {
        let started = Instant::now();
        info!(ecosystem = %job.ecosystem(), "job started");
        self.write_status(job.id(), JobStatus::Pending, None).await;

        match self.run_stages(&job).await {
            Ok(artifact) => {
                self.write_status(job.id(), JobStatus::Complete, None).await;
                info!(
                    artifact = %artifact.display(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "job complete"
                );
                JobOutcome {
                    job_id: job.id().clone(),
                    status: JobStatus::Complete,
                    error_message: None,
                    error_kind: None,
                    artifact: Some(artifact),
                    duration: started.elapsed(),
                }
            }
            Err(err) => {
                let message = truncate_message(&err.to_string());
                error!(kind = err.kind(), error = %err, "job failed");
                self.write_status(job.id(), JobStatus::Failed, Some(message.clone()))
                    .await;
                JobOutcome {
                    job_id: job.id().clone(),
                    status: JobStatus::Failed,
                    error_message: Some(message),
                    error_kind: Some(err.kind()),
                    artifact: None,
                    duration: started.elapsed(),
                }
            }
        }
    }

    async fn run_stages(&self, job: &Job) -> Result<PathBuf, PipelineError> {
        // Extract
        self.write_status(job.id(), JobStatus::Extracting, None).await;
        info!(stage = "extract", archive = %job.archive_path().display(), "stage started");
        let summary = self
            .extractor
            .extract_blocking(
                job.archive_path().to_path_buf(),
                job.extraction_dir().to_path_buf(),
            )
            .await?;
        info!(
            stage = "extract",
            members = summary.members,
            files = summary.files,
            bytes = summary.bytes,
            "archive extracted"
        );

        let root = self.locate_root(job).await?;
        info!(stage = "locate", root = %root.display(), "project root located");

        // Generate
        self.write_status(job.id(), JobStatus::Generating, None).await;
        let spec = self
            .registry
            .build_or_explain(job.ecosystem(), job.external_id(), &root)?;
        info!(stage = "generate", tool = spec.tool_name(), "stage started");

        let result = self.runner.run(&spec, self.generation_timeout).await;
        if let Some(err) = result.to_error() {
            return Err(err);
        }
        info!(
            stage = "generate",
            tool = spec.tool_name(),
            elapsed_ms = result.duration.as_millis() as u64,
            "generator finished"
        );

        // Upload
        let artifact = spec.output_path().to_path_buf();
        info!(stage = "upload", project = %job.external_id(), "stage started");
        self.tracking.upload_bom(&artifact, job.external_id()).await?;
        Ok(artifact)
    }

    async fn locate_root(&self, job: &Job) -> Result<PathBuf, PipelineError> {
        let locator = self.locator;
        let dest = job.extraction_dir().to_path_buf();
        let hint = job.root_hint().map(str::to_string);
        let ecosystem = job.ecosystem();

        tokio::task::spawn_blocking(move || {
            let root = locator.locate(&dest, hint.as_deref(), ecosystem);
            ensure_dir_within(&dest, &root)
        })
        .await
        .map_err(|e| PipelineError::SupervisorFault {
            details: format!("root location task failed: {}", e),
        })?
    }

    async fn write_status(&self, job_id: &JobId, status: JobStatus, message: Option<String>) {
        let attempts = self.status_policy.attempts.max(1);
        for attempt in 1..=attempts {
            let write = self.statuses.update_status(job_id, status, message.clone());
            match tokio::time::timeout(self.status_policy.timeout, write).await {
                Ok(Ok(())) => {
                    info!(status = %status, "status recorded");
                    return;
                }
                Ok(Err(e)) => {
                    warn!(status = %status, attempt, error = %e, "status write failed")
                }
                Err(_) => warn!(status = %status, attempt, "status write timed out"),
            }
        }
        error!(status = %status, attempts, "giving up on status write");
    }
}

#[async_trait]
impl<S, T, P> PipelinePort for RunPipelineUseCase<S, T, P>
where
    S: StatusRepository,
    T: TrackingService,
    P: ProcessRunner,
{
    async fn run(&self, job: Job) -> JobOutcome {
        let span = tracing::info_span!("pipeline", job_id = %job.id());
        self.execute(job).instrument(span).await
    }
}
