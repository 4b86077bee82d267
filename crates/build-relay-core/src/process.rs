// crates/build-relay-core/src/process.rs
// ============================================================================
// Module: Process Runner
// Description: Bounded execution of external programs inside a sandbox.
// Purpose: Run shelled-out helpers synchronously with a hard timeout.
// Dependencies: thiserror, std
// ============================================================================

//! ## Overview
//! [`ProcessRunner`] spawns a child process in a working directory, drains its
//! stdout and stderr on helper threads, and polls for exit until the configured
//! timeout elapses. A child that outlives the timeout is killed and reported as
//! [`ProcessError::TimedOut`].
//! Invariants:
//! - `run` never returns while the child is still running.
//! - Output drains share the child's deadline, so a background grandchild
//!   holding the pipes open cannot stretch `run` past the timeout.
//! - A non-zero exit status is an error carrying the captured stderr.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsString;
use std::io;
use std::io::Read;
use std::path::Path;
use std::process::Child;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;
use std::sync::mpsc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::RecvTimeoutError;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default timeout applied to external processes.
pub const DEFAULT_PROCESS_TIMEOUT: Duration = Duration::from_secs(60 * 60);
/// Longest deadline the runner will compute.
const MAX_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);
/// Interval between exit-status polls.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while running external processes.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Waiting on the child failed.
    #[error("failed to wait for {program}: {source}")]
    Wait {
        /// Program name.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The child ran past the timeout and was killed.
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    TimedOut {
        /// Program name.
        program: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },
    /// The child exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        /// Program name.
        program: String,
        /// Exit status.
        status: ExitStatus,
        /// Captured standard error.
        stderr: String,
    },
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Captured output of a successful process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit status (always successful).
    pub status: ExitStatus,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Runs external programs with a bounded timeout.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    /// Maximum wall-clock time a child may run.
    timeout: Duration,
    /// Extra environment variables passed to every child.
    env: Vec<(OsString, OsString)>,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESS_TIMEOUT)
    }
}

impl ProcessRunner {
    /// Creates a runner with the provided timeout.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            env: Vec::new(),
        }
    }

    /// Adds an environment variable passed to every child.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Returns the configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `program` with `args` in `cwd`, waiting at most the timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when the child cannot be spawned, times out,
    /// or exits unsuccessfully.
    pub fn run<S: AsRef<str>>(
        &self,
        cwd: &Path,
        program: &str,
        args: &[S],
        extra_env: &[(&str, String)],
    ) -> Result<ProcessOutput, ProcessError> {
        let mut command = Command::new(program);
        command
            .args(args.iter().map(AsRef::as_ref))
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &self.env {
            command.env(key, value);
        }
        for (key, value) in extra_env {
            command.env(key, value);
        }
        let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?;
        let deadline = Instant::now() + self.timeout.min(MAX_TIMEOUT);
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.wait(&mut child, program, deadline) {
            Ok(status) => status,
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(err);
            }
        };
        let stdout = self.collect(stdout, program, deadline)?;
        let stderr = self.collect(stderr, program, deadline)?;
        if !status.success() {
            return Err(ProcessError::Failed {
                program: program.to_string(),
                status,
                stderr: stderr.trim_end().to_string(),
            });
        }
        Ok(ProcessOutput {
            status,
            stdout,
            stderr,
        })
    }

    /// Polls the child until it exits or the deadline passes.
    fn wait(
        &self,
        child: &mut Child,
        program: &str,
        deadline: Instant,
    ) -> Result<ExitStatus, ProcessError> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(source) => {
                    return Err(ProcessError::Wait {
                        program: program.to_string(),
                        source,
                    });
                }
            }
            if Instant::now() >= deadline {
                return Err(self.timed_out(program));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Waits for a drain thread's output until the deadline passes.
    fn collect(
        &self,
        pipe: Option<Receiver<String>>,
        program: &str,
        deadline: Instant,
    ) -> Result<String, ProcessError> {
        let Some(pipe) = pipe else {
            return Ok(String::new());
        };
        match pipe.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(output) => Ok(output),
            Err(RecvTimeoutError::Timeout) => Err(self.timed_out(program)),
            Err(RecvTimeoutError::Disconnected) => Ok(String::new()),
        }
    }

    /// Builds the timeout error for `program`.
    fn timed_out(&self, program: &str) -> ProcessError {
        ProcessError::TimedOut {
            program: program.to_string(),
            timeout: self.timeout,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Drains a child pipe on a helper thread, sending the text once the pipe
/// closes.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<String>> {
    pipe.map(|mut pipe| {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = sender.send(String::from_utf8_lossy(&buf).into_owned());
        });
        receiver
    })
}
