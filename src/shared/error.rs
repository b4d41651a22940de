use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow callers to distinguish a job that ran and failed
/// from a problem with the invocation itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - every submitted job reached `Complete`
    Success = 0,
    /// At least one job ended in `Failed`
    JobFailed = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (configuration, network, file I/O, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::JobFailed => write!(f, "Job Failed (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Errors raised by the generation pipeline.
///
/// Every variant is caught at the stage boundary that produced it and turned
/// into a truncated `Failed` status message; none of them terminate the host
/// process.
#[derive(Debug, Error)]
pub enum PipelineError {
    // --- extraction ---
    #[error("Unsupported archive format: {path}\n\n💡 Hint: only zip and tar (optionally gzip-compressed) archives are accepted")]
    UnsupportedFormat { path: PathBuf },

    #[error("Corrupt archive: {details}")]
    CorruptArchive { details: String },

    #[error("Path traversal in archive member: {member}")]
    PathTraversal { member: String },

    #[error("Unsafe archive member ({kind}): {member}")]
    UnsafeMember { member: String, kind: &'static str },

    #[error("Archive quota exceeded: {details}")]
    QuotaExceeded { details: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // --- command construction ---
    #[error("No generator command available for {ecosystem}: {reason}")]
    NoCommandAvailable { ecosystem: String, reason: String },

    // --- execution ---
    #[error("Tool not found on execution path: {tool}")]
    ToolNotFound { tool: String },

    #[error("{tool} exited with code {code}: {stderr}")]
    NonZeroExit {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("{tool} timed out after {seconds}s and was terminated")]
    Timeout { tool: String, seconds: u64 },

    #[error("Supervisor fault: {details}")]
    SupervisorFault { details: String },

    // --- upload ---
    #[error("Remote call failed ({operation}): {details}")]
    RemoteCallFailed {
        operation: &'static str,
        details: String,
    },

    #[error("Artifact missing: {path}")]
    ArtifactMissing { path: PathBuf },

    // --- request validation ---
    #[error("Unsupported ecosystem: {value}\n\n💡 Hint: supported identifiers are {supported}")]
    UnsupportedEcosystem { value: String, supported: String },

    #[error("Invalid request: {reason}\n\n💡 Hint: {hint}")]
    InvalidRequest { reason: String, hint: String },
}

impl PipelineError {
    /// Stable label for the error kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedFormat { .. } => "UnsupportedFormat",
            PipelineError::CorruptArchive { .. } => "CorruptArchive",
            PipelineError::PathTraversal { .. } => "PathTraversal",
            PipelineError::UnsafeMember { .. } => "UnsafeMember",
            PipelineError::QuotaExceeded { .. } => "QuotaExceeded",
            PipelineError::Io { .. } => "Io",
            PipelineError::NoCommandAvailable { .. } => "NoCommandAvailable",
            PipelineError::ToolNotFound { .. } => "ToolNotFound",
            PipelineError::NonZeroExit { .. } => "NonZeroExit",
            PipelineError::Timeout { .. } => "Timeout",
            PipelineError::SupervisorFault { .. } => "SupervisorFault",
            PipelineError::RemoteCallFailed { .. } => "RemoteCallFailed",
            PipelineError::ArtifactMissing { .. } => "ArtifactMissing",
            PipelineError::UnsupportedEcosystem { .. } => "UnsupportedEcosystem",
            PipelineError::InvalidRequest { .. } => "InvalidRequest",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}
