use super::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a job.
///
/// Progress only moves forward: `Pending -> Extracting -> Generating ->
/// Complete`. `Failed` may be entered from any non-terminal state. `Complete`
/// and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum JobStatus {
    Pending,
    Extracting,
    Generating,
    Complete,
    Failed,
}

impl JobStatus {
    /// Persisted numeric code.
    pub fn code(&self) -> i32 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Extracting => 1,
            JobStatus::Generating => 2,
            JobStatus::Complete => 3,
            JobStatus::Failed => -1,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(JobStatus::Pending),
            1 => Some(JobStatus::Extracting),
            2 => Some(JobStatus::Generating),
            3 => Some(JobStatus::Complete),
            -1 => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }

    /// Whether a record currently in `self` may be overwritten with `next`.
    ///
    /// Re-writing the same non-terminal state is allowed so that a retried
    /// status write stays harmless.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            JobStatus::Failed => true,
            _ => next.code() >= self.code(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobStatus::Pending => "Pending",
            JobStatus::Extracting => "Extracting",
            JobStatus::Generating => "Generating",
            JobStatus::Complete => "Complete",
            JobStatus::Failed => "Failed",
        };
        write!(f, "{}({})", label, self.code())
    }
}

impl From<JobStatus> for i32 {
    fn from(status: JobStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i32> for JobStatus {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        JobStatus::from_code(code).ok_or_else(|| format!("unknown job status code {}", code))
    }
}

/// Persisted view of a job's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StatusRecord {
    pub fn new(job_id: JobId, status: JobStatus, error_message: Option<String>) -> Self {
        Self {
            job_id,
            status,
            error_message,
            updated_at: Utc::now(),
        }
    }
}
