use crate::sbom_generation::domain::{CommandSpec, ProcessResult};
use async_trait::async_trait;
use std::time::Duration;

/// ProcessRunner port for executing generator commands
///
/// Runs the command's pre-commands and then its main command, stopping at the
/// first step that does not succeed. `timeout` bounds the whole run.
/// Failures are described by the returned result, never by a panic or
/// error.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec, timeout: Duration) -> ProcessResult;
}
