use crate::sbom_generation::domain::ExternalProjectId;
use crate::shared::error::PipelineError;
use crate::shared::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// TrackingService port for the external component-tracking service
///
/// Mutating calls used by the pipeline. Failures are reported as
/// `RemoteCallFailed` once retries are exhausted, or `ArtifactMissing`
/// when there is nothing to upload.
#[async_trait]
pub trait TrackingService: Send + Sync {
    /// Creates a project and returns its identifier.
    async fn create_project(&self, name: &str) -> std::result::Result<ExternalProjectId, PipelineError>;

    /// Deletes a project. A project that is already gone counts as deleted.
    async fn delete_project(&self, id: &ExternalProjectId) -> std::result::Result<(), PipelineError>;

    /// Uploads a BOM artifact to the project.
    async fn upload_bom(
        &self,
        artifact: &Path,
        id: &ExternalProjectId,
    ) -> std::result::Result<(), PipelineError>;
}

/// Paging parameters for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: 10,
        }
    }
}

/// TrackingQueries port for read-only views served by the tracking service
///
/// Queries are attempted once. `Ok(None)` means the service answered with
/// something other than success; `Err` is reserved for transport failures
/// and invalid input.
#[async_trait]
pub trait TrackingQueries: Send + Sync {
    async fn components(
        &self,
        id: &ExternalProjectId,
        search_text: Option<&str>,
        page: PageRequest,
    ) -> Result<Option<Value>>;

    async fn findings(&self, id: &ExternalProjectId, search_text: Option<&str>) -> Result<Option<Value>>;

    async fn metrics(&self, id: &ExternalProjectId) -> Result<Option<Value>>;

    /// Top-level dependency graph of a project.
    async fn project_graph(&self, id: &ExternalProjectId) -> Result<Option<Value>>;

    /// Dependencies of one component, with repository metadata.
    async fn component_graph(&self, component_id: &str) -> Result<Option<Value>>;

    async fn vulnerability(&self, vuln_id: &str) -> Result<Option<Value>>;
}
