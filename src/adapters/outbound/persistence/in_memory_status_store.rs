use crate::ports::outbound::{ensure_transition, StatusRepository};
use crate::sbom_generation::domain::{JobId, JobStatus, StatusRecord};
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// InMemoryStatusStore adapter keeping status records in a concurrent map
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusStore {
    records: Arc<DashMap<JobId, StatusRecord>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, ordered by job id.
    pub fn snapshot(&self) -> Vec<StatusRecord> {
        let mut records: Vec<StatusRecord> = self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.job_id.cmp(&b.job_id));
        records
    }
}

#[async_trait]
impl StatusRepository for InMemoryStatusStore {
    async fn update_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        error_message: Option<String>,
    ) -> Result<()> {
        match self.records.entry(job_id.clone()) {
            Entry::Occupied(mut entry) => {
                ensure_transition(job_id, Some(entry.get().status), status)?;
                entry.insert(StatusRecord::new(job_id.clone(), status, error_message));
            }
            Entry::Vacant(entry) => {
                entry.insert(StatusRecord::new(job_id.clone(), status, error_message));
            }
        }
        Ok(())
    }

    async fn get_status(&self, job_id: &JobId) -> Result<Option<StatusRecord>> {
        Ok(self.records.get(job_id).map(|r| r.value().clone()))
    }

    async fn remove(&self, job_id: &JobId) -> Result<()> {
        self.records.remove(job_id);
        Ok(())
    }
}
