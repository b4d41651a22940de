use crate::sbom_generation::domain::Ecosystem;
use crate::shared::error::PipelineError;
use std::path::PathBuf;

/// Accepted archive suffixes, longest first so `.tar.gz` wins over `.gz`.
const ARCHIVE_SUFFIXES: &[&str] = &[
    ".tar.gz", ".tar.bz2", ".tar.xz", ".tgz", ".tbz2", ".txz", ".zip", ".tar",
];

/// JobRequest - Request DTO for submitting one archive to the pipeline
///
/// `file_name` is the name the archive was uploaded under. It is only used
/// for validation and for the root hint; the content is read from
/// `archive_path`.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub archive_path: PathBuf,
    pub file_name: String,
    pub ecosystem: String,
}

impl JobRequest {
    pub fn new(archive_path: PathBuf, file_name: impl Into<String>, ecosystem: impl Into<String>) -> Self {
        Self {
            archive_path,
            file_name: file_name.into(),
            ecosystem: ecosystem.into(),
        }
    }

    /// Request for a local archive, named after its own file name.
    pub fn from_path(archive_path: PathBuf, ecosystem: impl Into<String>) -> Self {
        let file_name = archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(archive_path, file_name, ecosystem)
    }

    pub fn parsed_ecosystem(&self) -> Result<Ecosystem, PipelineError> {
        self.ecosystem.parse()
    }

    /// Final path segment of the declared file name.
    ///
    /// # Errors
    /// `InvalidRequest` if nothing usable remains or the name does not carry
    /// an archive suffix.
    pub fn base_name(&self) -> Result<String, PipelineError> {
        let base = self
            .file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();

        if base.is_empty() || base == "." || base == ".." || base.contains('\0') {
            return Err(PipelineError::InvalidRequest {
                reason: format!("invalid archive file name: {:?}", self.file_name),
                hint: "upload the archive under its own file name".to_string(),
            });
        }

        if archive_suffix(base).is_none() {
            return Err(PipelineError::InvalidRequest {
                reason: format!("{} is not an archive", base),
                hint: "accepted suffixes are .zip, .tar, .tar.gz, .tgz, .tar.bz2, .tbz2, .tar.xz and .txz".to_string(),
            });
        }

        Ok(base.to_string())
    }

    /// Expected top-level directory inside the archive: the base name
    /// without its archive suffix.
    pub fn root_hint(&self) -> Option<String> {
        let base = self.base_name().ok()?;
        let suffix = archive_suffix(&base)?;
        let stem = &base[..base.len() - suffix.len()];
        (!stem.is_empty()).then(|| stem.to_string())
    }
}

fn archive_suffix(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    ARCHIVE_SUFFIXES
        .iter()
        .copied()
        .find(|suffix| lower.ends_with(suffix))
}
