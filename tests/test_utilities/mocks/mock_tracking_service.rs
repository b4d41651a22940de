use async_trait::async_trait;
use sbom_pipeline::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock TrackingService that counts calls and keeps uploaded BOM contents
#[derive(Default, Clone)]
pub struct RecordingTrackingService {
    pub creates: Arc<AtomicUsize>,
    pub deletes: Arc<AtomicUsize>,
    pub uploads: Arc<Mutex<Vec<(String, String)>>>,
    pub fail_uploads: bool,
}

impl RecordingTrackingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// `(project id, BOM content)` per successful upload.
    pub fn uploaded(&self) -> Vec<(String, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackingService for RecordingTrackingService {
    async fn create_project(&self, name: &str) -> std::result::Result<ExternalProjectId, PipelineError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(ExternalProjectId::new(format!("uuid-{}", name)).unwrap())
    }

    async fn delete_project(&self, _id: &ExternalProjectId) -> std::result::Result<(), PipelineError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upload_bom(
        &self,
        artifact: &Path,
        id: &ExternalProjectId,
    ) -> std::result::Result<(), PipelineError> {
        if self.fail_uploads {
            return Err(PipelineError::RemoteCallFailed {
                operation: "upload BOM",
                details: "HTTP 400: invalid BOM".to_string(),
            });
        }
        let content = std::fs::read_to_string(artifact).map_err(|_| PipelineError::ArtifactMissing {
            path: artifact.to_path_buf(),
        })?;
        self.uploads
            .lock()
            .unwrap()
            .push((id.as_str().to_string(), content));
        Ok(())
    }
}
