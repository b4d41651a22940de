use async_trait::async_trait;
use sbom_pipeline::ports::outbound::ensure_transition;
use sbom_pipeline::prelude::*;
use std::sync::{Arc, Mutex};

type StatusWrite = (JobId, JobStatus, Option<String>);

/// Mock StatusRepository that records every accepted write in order
#[derive(Default, Clone)]
pub struct RecordingStatusRepository {
    pub writes: Arc<Mutex<Vec<StatusWrite>>>,
}

impl RecordingStatusRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses written for `job_id`, oldest first.
    pub fn statuses_for(&self, job_id: &JobId) -> Vec<JobStatus> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _, _)| id == job_id)
            .map(|(_, status, _)| *status)
            .collect()
    }

    pub fn last_message(&self, job_id: &JobId) -> Option<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, _, _)| id == job_id)
            .and_then(|(_, _, message)| message.clone())
    }

    fn current(&self, job_id: &JobId) -> Option<JobStatus> {
        self.statuses_for(job_id).last().copied()
    }
}

#[async_trait]
impl StatusRepository for RecordingStatusRepository {
    async fn update_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        error_message: Option<String>,
    ) -> Result<()> {
        ensure_transition(job_id, self.current(job_id), status)?;
        self.writes
            .lock()
            .unwrap()
            .push((job_id.clone(), status, error_message));
        Ok(())
    }

    async fn get_status(&self, job_id: &JobId) -> Result<Option<StatusRecord>> {
        Ok(self
            .current(job_id)
            .map(|status| StatusRecord::new(job_id.clone(), status, self.last_message(job_id))))
    }

    async fn remove(&self, job_id: &JobId) -> Result<()> {
        self.writes.lock().unwrap().retain(|(id, _, _)| id != job_id);
        Ok(())
    }
}
