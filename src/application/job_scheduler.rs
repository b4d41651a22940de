use crate::ports::inbound::{JobOutcome, PipelinePort};
use crate::ports::outbound::StatusRepository;
use crate::sbom_generation::domain::{Job, JobStatus};
use crate::shared::error::PipelineError;
use crate::shared::text::truncate_message;
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// JobScheduler runs each pipeline as an independent task.
///
/// Jobs share nothing but the runtime and the process supervisor's gate, so
/// they may finish in any order. A pipeline task that panics is resolved to
/// a `Failed` status instead of being lost.
pub struct JobScheduler<P, S> {
    pipeline: Arc<P>,
    statuses: S,
}

impl<P, S: Clone> Clone for JobScheduler<P, S> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            statuses: self.statuses.clone(),
        }
    }
}

impl<P, S> JobScheduler<P, S>
where
    P: PipelinePort + 'static,
    S: StatusRepository + Clone + 'static,
{
    pub fn new(pipeline: Arc<P>, statuses: S) -> Self {
        Self { pipeline, statuses }
    }

    /// Starts `job` in the background. Must be called inside a tokio runtime.
    pub fn submit(&self, job: Job) -> JoinHandle<JobOutcome> {
        let pipeline = Arc::clone(&self.pipeline);
        let statuses = self.statuses.clone();
        info!(job_id = %job.id(), ecosystem = %job.ecosystem(), "job scheduled");

        tokio::spawn(async move {
            let job_id = job.id().clone();
            let started = Instant::now();

            match tokio::spawn(async move { pipeline.run(job).await }).await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    let details = if join_error.is_panic() {
                        format!("pipeline panicked: {}", panic_text(join_error.into_panic()))
                    } else {
                        "pipeline task was cancelled".to_string()
                    };
                    let err = PipelineError::SupervisorFault { details };
                    error!(job_id = %job_id, kind = err.kind(), error = %err, "pipeline task aborted");

                    let message = truncate_message(&err.to_string());
                    if let Err(e) = statuses
                        .update_status(&job_id, JobStatus::Failed, Some(message.clone()))
                        .await
                    {
                        error!(job_id = %job_id, error = %e, "could not record failed status");
                    }

                    JobOutcome {
                        job_id,
                        status: JobStatus::Failed,
                        error_message: Some(message),
                        error_kind: Some(err.kind()),
                        artifact: None,
                        duration: started.elapsed(),
                    }
                }
            }
        })
    }
}

fn panic_text(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
