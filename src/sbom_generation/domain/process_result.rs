use crate::shared::error::PipelineError;
use crate::shared::text::truncate_message;
use std::time::Duration;

/// Exit indicator reported for a process killed on timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;
/// Exit indicator reported when the executable could not be resolved.
pub const TOOL_NOT_FOUND_EXIT_CODE: i32 = 127;
/// Exit indicator reported when the supervisor itself failed.
pub const SUPERVISOR_FAULT_EXIT_CODE: i32 = -1;

/// How a supervised execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process ran to completion with this exit code.
    Exited(i32),
    /// The wall-clock budget ran out and the process was killed.
    TimedOut(Duration),
    /// The executable could not be resolved; nothing was spawned.
    ToolNotFound,
    /// Spawning or waiting failed inside the supervisor.
    SupervisorFault(String),
}

/// Result of one supervised execution. Never mutated after it is returned.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub tool: String,
    pub outcome: ProcessOutcome,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessResult {
    pub fn new(
        tool: impl Into<String>,
        outcome: ProcessOutcome,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            tool: tool.into(),
            outcome,
            stdout,
            stderr,
            duration,
        }
    }

    /// Result for a command that never started.
    pub fn not_started(tool: impl Into<String>, outcome: ProcessOutcome) -> Self {
        Self::new(tool, outcome, String::new(), String::new(), Duration::ZERO)
    }

    pub fn exit_code(&self) -> i32 {
        match &self.outcome {
            ProcessOutcome::Exited(code) => *code,
            ProcessOutcome::TimedOut(_) => TIMEOUT_EXIT_CODE,
            ProcessOutcome::ToolNotFound => TOOL_NOT_FOUND_EXIT_CODE,
            ProcessOutcome::SupervisorFault(_) => SUPERVISOR_FAULT_EXIT_CODE,
        }
    }

    pub fn success(&self) -> bool {
        self.outcome == ProcessOutcome::Exited(0)
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.outcome, ProcessOutcome::TimedOut(_))
    }

    /// Maps an unsuccessful result onto the error taxonomy. `None` on success.
    pub fn to_error(&self) -> Option<PipelineError> {
        match &self.outcome {
            ProcessOutcome::Exited(0) => None,
            ProcessOutcome::Exited(code) => {
                let detail = if self.stderr.trim().is_empty() {
                    &self.stdout
                } else {
                    &self.stderr
                };
                Some(PipelineError::NonZeroExit {
                    tool: self.tool.clone(),
                    code: *code,
                    stderr: truncate_message(detail.trim()),
                })
            }
            ProcessOutcome::TimedOut(after) => Some(PipelineError::Timeout {
                tool: self.tool.clone(),
                seconds: after.as_secs(),
            }),
            ProcessOutcome::ToolNotFound => Some(PipelineError::ToolNotFound {
                tool: self.tool.clone(),
            }),
            ProcessOutcome::SupervisorFault(details) => Some(PipelineError::SupervisorFault {
                details: details.clone(),
            }),
        }
    }
}
