use super::Ecosystem;
use crate::shared::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum length for identifiers (security limit)
const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Directory under the storage root that holds the status records. Job
/// directories share that root, so no job may take this name.
pub const STATUS_DIR_NAME: &str = "status";

/// Identifiers end up in file names and command arguments, so only a
/// conservative character set is accepted.
fn validate_identifier(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        anyhow::bail!("{} cannot be empty", what);
    }

    if value.len() > MAX_IDENTIFIER_LENGTH {
        anyhow::bail!(
            "{} is too long ({} bytes). Maximum allowed: {} bytes",
            what,
            value.len(),
            MAX_IDENTIFIER_LENGTH
        );
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        anyhow::bail!(
            "{} contains invalid characters. Only ASCII alphanumerics, hyphens and underscores are allowed.",
            what
        );
    }

    Ok(())
}

/// NewType wrapper for a job identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_identifier(&id, "Job id")?;
        if id.eq_ignore_ascii_case(STATUS_DIR_NAME) {
            anyhow::bail!("Job id '{}' is reserved for the status directory", id);
        }
        Ok(Self(id))
    }

    /// Fresh random id (32 lowercase hex characters).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for JobId {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        JobId::new(value)
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

/// Identifier of the project in the tracking service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalProjectId(String);

impl ExternalProjectId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_identifier(&id, "External project id")?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the BOM artifact generated for this project.
    pub fn artifact_file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl std::fmt::Display for ExternalProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One SBOM generation request, as driven through the pipeline.
///
/// Paths are fixed at construction; there are no setters.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    external_id: ExternalProjectId,
    archive_path: PathBuf,
    extraction_dir: PathBuf,
    ecosystem: Ecosystem,
    root_hint: Option<String>,
}

impl Job {
    pub fn new(
        id: JobId,
        external_id: ExternalProjectId,
        archive_path: PathBuf,
        extraction_dir: PathBuf,
        ecosystem: Ecosystem,
        root_hint: Option<String>,
    ) -> Self {
        Self {
            id,
            external_id,
            archive_path,
            extraction_dir,
            ecosystem,
            root_hint: root_hint.filter(|h| !h.trim().is_empty()),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn external_id(&self) -> &ExternalProjectId {
        &self.external_id
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    pub fn extraction_dir(&self) -> &Path {
        &self.extraction_dir
    }

    pub fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    pub fn root_hint(&self) -> Option<&str> {
        self.root_hint.as_deref()
    }
}
