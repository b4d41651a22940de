use crate::ports::outbound::ProcessRunner;
use crate::sbom_generation::domain::{CommandSpec, ProcessOutcome, ProcessResult};
use crate::sbom_generation::services::ToolPath;
use crate::shared::text::truncate_chars;
use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default cap on captured characters per stream.
pub const DEFAULT_OUTPUT_LIMIT_CHARS: usize = 64 * 1024;

/// How long capture tasks may keep reading after the process is gone.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Longest run of bytes read before a line is handed on, newline or not.
const MAX_LINE_BYTES: u64 = 8 * 1024;

/// ProcessSupervisor adapter for running generator commands
///
/// Commands are executed directly from their argument vector, never through
/// a shell. The child sees a `PATH` built from the supervisor's [`ToolPath`]
/// and no stdin. Both output streams are read line by line as they arrive;
/// every line is logged at debug level, and at most `output_limit_chars`
/// characters per stream are kept for the result.
///
/// A counting gate bounds how many commands run at once across all jobs.
/// One permit covers a command's pre-commands and main command together.
///
/// On unix each command leads its own process group. When a command ends,
/// whether it exited or timed out, the group is killed so nothing it
/// started outlives its permit.
pub struct ProcessSupervisor {
    tools: ToolPath,
    gate: Arc<Semaphore>,
    output_limit_chars: usize,
}

impl ProcessSupervisor {
    pub fn new(tools: ToolPath, max_concurrent: usize, output_limit_chars: usize) -> Self {
        Self {
            tools,
            gate: Arc::new(Semaphore::new(max_concurrent.max(1))),
            output_limit_chars,
        }
    }

    /// Permits currently free at the concurrency gate.
    pub fn available_permits(&self) -> usize {
        self.gate.available_permits()
    }

    async fn run_step(
        &self,
        tool: &str,
        argv: &[String],
        working_dir: &Path,
        deadline: Instant,
        timeout: Duration,
    ) -> ProcessResult {
        let Some(program) = argv.first() else {
            return ProcessResult::not_started(
                tool,
                ProcessOutcome::SupervisorFault("empty argument vector".to_string()),
            );
        };

        let Some(resolved) = self.tools.resolve(program) else {
            warn!(tool, program = %program, "executable not found on tool path");
            return ProcessResult::not_started(tool, ProcessOutcome::ToolNotFound);
        };

        let started = Instant::now();
        let mut command = Command::new(&resolved);
        command
            .args(&argv[1..])
            .current_dir(working_dir)
            .env("PATH", self.tools.search_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(tool, error = %e, "failed to spawn");
                return ProcessResult::not_started(
                    tool,
                    ProcessOutcome::SupervisorFault(format!("failed to spawn {}: {}", program, e)),
                );
            }
        };
        let pid = child.id();
        debug!(tool, pid, cwd = %working_dir.display(), "spawned");

        let stdout = Arc::new(Mutex::new(String::new()));
        let stderr = Arc::new(Mutex::new(String::new()));
        let stdout_task = child.stdout.take().map(|reader| {
            spawn_capture(reader, "stdout", tool, self.output_limit_chars, Arc::clone(&stdout))
        });
        let stderr_task = child.stderr.take().map(|reader| {
            spawn_capture(reader, "stderr", tool, self.output_limit_chars, Arc::clone(&stderr))
        });

        let outcome = match tokio::time::timeout_at(deadline, child.wait()).await {
            Ok(Ok(status)) => ProcessOutcome::Exited(exit_code(status)),
            Ok(Err(e)) => ProcessOutcome::SupervisorFault(format!("failed waiting for {}: {}", program, e)),
            Err(_) => {
                warn!(tool, timeout_secs = timeout.as_secs(), "timed out, killing process group");
                if let Err(e) = child.start_kill() {
                    debug!(tool, error = %e, "kill failed, process may have exited");
                }
                let _ = child.wait().await;
                ProcessOutcome::TimedOut(timeout)
            }
        };
        kill_process_group(tool, pid);
        reap(&mut child).await;

        drain(stdout_task).await;
        drain(stderr_task).await;

        let result = ProcessResult::new(
            tool,
            outcome,
            take_captured(&stdout),
            take_captured(&stderr),
            started.elapsed(),
        );
        info!(
            tool,
            exit_code = result.exit_code(),
            duration_ms = result.duration.as_millis() as u64,
            "process finished"
        );
        result
    }
}

#[async_trait]
impl ProcessRunner for ProcessSupervisor {
    async fn run(&self, spec: &CommandSpec, timeout: Duration) -> ProcessResult {
        let _permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return ProcessResult::not_started(
                    spec.tool_name(),
                    ProcessOutcome::SupervisorFault("concurrency gate closed".to_string()),
                )
            }
        };

        let deadline = Instant::now() + timeout;
        let step_count = spec.pre_commands().len() + 1;
        let mut last = None;

        for (index, argv) in spec.steps().enumerate() {
            let is_main = index + 1 == step_count;
            let tool = if is_main {
                spec.tool_name()
            } else {
                argv.first().map(String::as_str).unwrap_or_default()
            };

            let result = self
                .run_step(tool, argv, spec.working_dir(), deadline, timeout)
                .await;
            if !result.success() {
                return result;
            }
            last = Some(result);
        }

        last.unwrap_or_else(|| {
            ProcessResult::not_started(
                spec.tool_name(),
                ProcessOutcome::SupervisorFault("no command to run".to_string()),
            )
        })
    }
}

fn spawn_capture<R>(
    reader: R,
    stream: &'static str,
    tool: &str,
    limit: usize,
    sink: Arc<Mutex<String>>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let tool = tool.to_string();
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut raw = Vec::new();
        let mut kept = 0usize;

        loop {
            raw.clear();
            let mut bounded = (&mut reader).take(MAX_LINE_BYTES);
            match bounded.read_until(b'\n', &mut raw).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&raw);
                    debug!(tool = %tool, stream, "{}", line.trim_end_matches(['\r', '\n']));

                    if kept < limit {
                        let piece = truncate_chars(&line, limit - kept);
                        kept += piece.chars().count();
                        if let Ok(mut captured) = sink.lock() {
                            captured.push_str(&piece);
                        }
                    }
                }
                Err(e) => {
                    debug!(tool = %tool, stream, error = %e, "output stream closed with error");
                    break;
                }
            }
        }
    })
}

/// Kills every process left in the group led by `pid`.
#[cfg(unix)]
fn kill_process_group(tool: &str, pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pgid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) => debug!(tool, pgid, "killed process group"),
        Err(Errno::ESRCH) => {}
        Err(e) => warn!(tool, pgid, error = %e, "failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_tool: &str, _pid: Option<u32>) {}

/// Collects the exit status if the child has not been waited on yet.
async fn reap(child: &mut Child) {
    if matches!(child.try_wait(), Ok(None)) {
        let _ = child.wait().await;
    }
}

/// Waits for a capture task, aborting it if the stream is held open.
async fn drain(task: Option<JoinHandle<()>>) {
    let Some(mut task) = task else {
        return;
    };
    if tokio::time::timeout(DRAIN_GRACE, &mut task).await.is_err() {
        task.abort();
    }
}

fn take_captured(buffer: &Arc<Mutex<String>>) -> String {
    buffer
        .lock()
        .map(|mut captured| std::mem::take(&mut *captured))
        .unwrap_or_default()
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
