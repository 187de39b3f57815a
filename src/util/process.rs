//! Subprocess execution utilities.
//!
//! Compiler output is not captured: children inherit stdout/stderr and only
//! the exit status is reported back. Every invocation can be bounded by a
//! timeout and aborted through a shared [`CancellationToken`].

use std::collections::HashMap;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// How often a bounded child is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Error from running a subprocess.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for `{program}`")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` timed out after {}s", timeout.as_secs_f64())]
    TimedOut { program: String, timeout: Duration },

    #[error("`{program}` was cancelled")]
    Cancelled { program: String },
}

/// Shared flag used to abort running processes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every process watching this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
            timeout: None,
            cancel: None,
        }
    }

    /// Run `command` through the platform shell.
    pub fn shell(command: &str) -> Self {
        if cfg!(windows) {
            ProcessBuilder::new("cmd").args(["/C", command])
        } else {
            ProcessBuilder::new("sh").args(["-c", command])
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Kill the child if it runs longer than `timeout`.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Kill the child when `token` is cancelled.
    pub fn cancel_on(mut self, token: &CancellationToken) -> Self {
        self.cancel = Some(token.clone());
        self
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute and return the exit status.
    pub fn status(&self) -> Result<ExitStatus, ProcessError> {
        let program = self.program.display().to_string();

        let mut child = self
            .build_command()
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.clone(),
                source,
            })?;

        if self.timeout.is_none() && self.cancel.is_none() {
            return child
                .wait()
                .map_err(|source| ProcessError::Wait { program, source });
        }

        self.wait_bounded(&mut child, program)
    }

    fn wait_bounded(&self, child: &mut Child, program: String) -> Result<ExitStatus, ProcessError> {
        let deadline = self.timeout.map(|t| Instant::now() + t);

        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(source) => return Err(ProcessError::Wait { program, source }),
            }

            if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                kill_and_reap(child);
                return Err(ProcessError::Cancelled { program });
            }

            if let (Some(deadline), Some(timeout)) = (deadline, self.timeout) {
                if Instant::now() >= deadline {
                    kill_and_reap(child);
                    return Err(ProcessError::TimedOut { program, timeout });
                }
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

fn kill_and_reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::debug!("failed to kill child process: {}", e);
    }
    let _ = child.wait();
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
