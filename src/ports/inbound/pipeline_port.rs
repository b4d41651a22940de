use crate::sbom_generation::domain::{Job, JobId, JobStatus};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Final result of one pipeline run.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job_id: JobId,
    /// `Complete` or `Failed`
    pub status: JobStatus,
    /// Truncated diagnostic for a failed job
    pub error_message: Option<String>,
    /// Error kind label for a failed job
    pub error_kind: Option<&'static str>,
    /// Uploaded artifact, when generation succeeded
    pub artifact: Option<PathBuf>,
    pub duration: Duration,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Complete
    }
}

/// PipelinePort - Inbound port for running a job through the pipeline
///
/// A run never returns an error: every failure resolves to a `Failed`
/// outcome, mirrored in the status record.
#[async_trait]
pub trait PipelinePort: Send + Sync {
    async fn run(&self, job: Job) -> JobOutcome;
}
