//! Process-based runtime

use super::{Completion, Invocation};
use crate::error::{Result, SandboxError};
use crate::recorder::Recorder;
use crate::types::EventKind;
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

enum Interrupt {
    Deadline,
    Cancelled,
}

enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    Interrupted(Interrupt),
}

/// Process-based runtime - runs the engine as a child process in its own
/// process group
pub struct ProcessRuntime;

impl ProcessRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl super::Runtime for ProcessRuntime {
    async fn run(&self, invocation: Invocation, cancel: &CancellationToken) -> Result<Completion> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .env_clear()
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&invocation.current_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + invocation.deadline;
        let mut child = command.spawn().map_err(|source| SandboxError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        let pid = child.id();
        debug!(program = %invocation.program, pid, "Spawned engine");

        let recorder = Recorder::new(started);
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(recorder.capture(stdout, EventKind::Stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(recorder.capture(stderr, EventKind::Stderr));
        }

        let outcome = tokio::select! {
            status = child.wait() => Outcome::Exited(status),
            _ = tokio::time::sleep_until(deadline) => Outcome::Interrupted(Interrupt::Deadline),
            _ = cancel.cancelled() => Outcome::Interrupted(Interrupt::Cancelled),
        };

        let status = match outcome {
            Outcome::Exited(Ok(status)) => status,
            Outcome::Exited(Err(e)) => {
                terminate(&mut child, pid).await;
                abort_all(&readers);
                return Err(SandboxError::Io(e));
            }
            Outcome::Interrupted(interrupt) => {
                terminate(&mut child, pid).await;
                abort_all(&readers);
                return Err(interrupted(interrupt, &invocation));
            }
        };
        let duration = started.elapsed();

        // Children left in the background keep the pipes open; what they
        // write still counts until the deadline.
        let drained = tokio::select! {
            result = drain(&mut readers) => Ok(result),
            _ = tokio::time::sleep_until(deadline) => Err(Interrupt::Deadline),
            _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        };
        kill_group(pid);
        match drained {
            Ok(result) => result?,
            Err(interrupt) => {
                abort_all(&readers);
                return Err(interrupted(interrupt, &invocation));
            }
        }
        let recording = recorder.finish().await;

        info!(
            program = %invocation.program,
            exit_code = status.code(),
            elapsed_ms = duration.as_millis() as u64,
            chunks = recording.chunks.len(),
            "Engine exited"
        );

        Ok(Completion {
            exit_code: status.code(),
            duration,
            recording,
        })
    }

    fn name(&self) -> &str {
        "process"
    }
}

/// Kill the engine (and its process group) without grace, then reap it
async fn terminate(child: &mut Child, pid: Option<u32>) {
    kill_group(pid);
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "start_kill after group kill");
    }
    if let Err(e) = child.wait().await {
        warn!(pid, error = %e, "Failed to reap killed engine");
    }
}

#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(pid, error = %e, "Failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}

fn interrupted(interrupt: Interrupt, invocation: &Invocation) -> SandboxError {
    match interrupt {
        Interrupt::Deadline => {
            info!(
                program = %invocation.program,
                deadline_ms = invocation.deadline.as_millis() as u64,
                "Engine exceeded deadline, killed"
            );
            SandboxError::Timeout {
                deadline: invocation.deadline,
            }
        }
        Interrupt::Cancelled => {
            info!(program = %invocation.program, "Execution cancelled, engine killed");
            SandboxError::Cancelled
        }
    }
}

fn abort_all(readers: &[JoinHandle<std::io::Result<()>>]) {
    for reader in readers {
        reader.abort();
    }
}

/// Wait for every capture task to reach EOF
async fn drain(readers: &mut [JoinHandle<std::io::Result<()>>]) -> Result<()> {
    for reader in readers.iter_mut() {
        match reader.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(SandboxError::Io(e)),
            Err(join) => return Err(SandboxError::Io(std::io::Error::other(join))),
        }
    }
    Ok(())
}
