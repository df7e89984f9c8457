//! Subprocess execution with bounded timeouts.
//!
//! Commands run with an explicit working directory and have their stdout and
//! stderr drained into one combined buffer. Three limits apply: a gap
//! between output chunks longer than the idle timeout, a total read time
//! beyond the deadline, or an exit that takes longer than the termination
//! wait after the pipes close. Hitting any of them kills the child. A scoped
//! guard kills and reaps the child on every early exit path, so callers only
//! ever see a [`Result`].

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fmt;
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

/// A command line together with the directory it runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    working_dir: Option<Utf8PathBuf>,
}

impl Invocation {
    /// Starts an invocation of `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the directory the command runs in.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// The program to execute.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The arguments passed to the program.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// The directory the command runs in, if one was set.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Utf8Path> {
        self.working_dir.as_deref()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs `invocation` to completion and returns its combined output.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when the command cannot be started, exits
    /// unsuccessfully, or exceeds a timeout.
    fn run(&self, invocation: &Invocation) -> Result<String, ProcessError>;
}

/// The limit a command exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    /// No output arrived for the idle period.
    Idle(Duration),
    /// Output was still arriving at the overall deadline.
    Deadline(Duration),
    /// The process did not exit after its output closed.
    Termination(Duration),
}

impl fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle(limit) => write!(f, "no output for {} seconds", limit.as_secs()),
            Self::Deadline(limit) => write!(f, "still running after {} seconds", limit.as_secs()),
            Self::Termination(limit) => {
                write!(f, "did not exit within {} seconds", limit.as_secs())
            }
        }
    }
}

/// Errors arising from subprocess execution.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The command could not be started.
    #[error("failed to execute {command}: {source}")]
    Spawn {
        /// The rendered command line.
        command: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// Reading output or waiting for the process failed.
    #[error("I/O error while running {command}: {source}")]
    Io {
        /// The rendered command line.
        command: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The command exceeded one of its time limits and was killed.
    #[error("{command} timed out ({kind}):\n{output}")]
    Timeout {
        /// The rendered command line.
        command: String,
        /// Which limit was exceeded.
        kind: TimeoutKind,
        /// Output captured before the timeout.
        output: String,
    },

    /// The command exited unsuccessfully.
    #[error("process returned {status}:\n{command}:\n{output}")]
    Failed {
        /// The rendered command line.
        command: String,
        /// The exit status description.
        status: String,
        /// Combined stdout and stderr.
        output: String,
    },
}

/// Time limits applied to every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessTimeouts {
    /// Longest permitted gap between output chunks.
    pub idle: Duration,
    /// Longest permitted total time reading output.
    pub deadline: Duration,
    /// Longest wait for the process to exit after its output closes.
    pub termination: Duration,
}

impl Default for ProcessTimeouts {
    fn default() -> Self {
        Self {
            idle: Duration::from_secs(30),
            deadline: Duration::from_secs(300),
            termination: Duration::from_secs(30),
        }
    }
}

/// Executes commands on the host system.
///
/// # Examples
///
/// ```no_run
/// use javadoc_publisher::process::{CommandExecutor, Invocation, SystemCommandExecutor};
///
/// let executor = SystemCommandExecutor::default();
/// let output = executor.run(&Invocation::new("git").arg("--version"))?;
/// assert!(output.starts_with("git version"));
/// # Ok::<(), javadoc_publisher::process::ProcessError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor {
    timeouts: ProcessTimeouts,
}

impl SystemCommandExecutor {
    /// Creates an executor applying `timeouts` to every command.
    #[must_use]
    pub const fn new(timeouts: ProcessTimeouts) -> Self {
        Self { timeouts }
    }

    /// The limits this executor applies.
    #[must_use]
    pub const fn timeouts(&self) -> ProcessTimeouts {
        self.timeouts
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, invocation: &Invocation) -> Result<String, ProcessError> {
        let command_line = invocation.to_string();
        debug!("running {command_line}");

        let mut command = Command::new(invocation.program());
        command
            .args(invocation.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = invocation.working_dir() {
            command.current_dir(dir.as_std_path());
        }

        let child = command.spawn().map_err(|source| ProcessError::Spawn {
            command: command_line.clone(),
            source,
        })?;
        let mut guard = ChildGuard::new(child);

        let (sender, receiver) = mpsc::channel();
        let mut open_streams = 0;
        if let Some(stdout) = guard.child.stdout.take() {
            spawn_pump(stdout, sender.clone());
            open_streams += 1;
        }
        if let Some(stderr) = guard.child.stderr.take() {
            spawn_pump(stderr, sender.clone());
            open_streams += 1;
        }
        drop(sender);

        let mut collector = OutputCollector::new(self.timeouts);
        let drained = collector.drain(&receiver, open_streams);
        let output = collector.into_output();

        match drained {
            Ok(()) => {}
            Err(StreamFailure::Timeout(kind)) => {
                return Err(ProcessError::Timeout {
                    command: command_line,
                    kind,
                    output,
                });
            }
            Err(StreamFailure::Io(source)) => {
                return Err(ProcessError::Io {
                    command: command_line,
                    source,
                });
            }
        }

        let status = guard
            .wait(self.timeouts.termination)
            .map_err(|source| ProcessError::Io {
                command: command_line.clone(),
                source,
            })?;

        match status {
            None => Err(ProcessError::Timeout {
                command: command_line,
                kind: TimeoutKind::Termination(self.timeouts.termination),
                output,
            }),
            Some(status) if status.success() => Ok(output),
            Some(status) => Err(ProcessError::Failed {
                command: command_line,
                status: describe_status(status),
                output,
            }),
        }
    }
}

fn describe_status(status: ExitStatus) -> String {
    status
        .code()
        .map_or_else(|| status.to_string(), |code| code.to_string())
}

/// Kills and reaps the child unless it has already been waited on.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    const fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    fn wait(&mut self, limit: Duration) -> io::Result<Option<ExitStatus>> {
        let status = self.child.wait_timeout(limit)?;
        self.reaped = status.is_some();
        Ok(status)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.reaped {
            if self.child.kill().is_err() {
                // The process may already have exited.
            }
            if self.child.wait().is_err() {
                // Nothing left to reap.
            }
        }
    }
}

enum Chunk {
    Data(Vec<u8>),
    Closed,
    Failed(io::Error),
}

enum StreamFailure {
    Timeout(TimeoutKind),
    Io(io::Error),
}

/// Forward everything read from `source` to `sender` on a helper thread.
fn spawn_pump<R: Read + Send + 'static>(mut source: R, sender: Sender<Chunk>) {
    thread::spawn(move || {
        let mut buffer = [0_u8; 8192];
        loop {
            match source.read(&mut buffer) {
                Ok(0) => {
                    if sender.send(Chunk::Closed).is_err() {
                        // Receiver gone; the run already finished.
                    }
                    return;
                }
                Ok(read) => {
                    let bytes = buffer.get(..read).unwrap_or_default().to_vec();
                    if sender.send(Chunk::Data(bytes)).is_err() {
                        return;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    if sender.send(Chunk::Failed(e)).is_err() {
                        // Receiver gone; the run already finished.
                    }
                    return;
                }
            }
        }
    });
}

struct OutputCollector {
    timeouts: ProcessTimeouts,
    output: Vec<u8>,
}

impl OutputCollector {
    const fn new(timeouts: ProcessTimeouts) -> Self {
        Self {
            timeouts,
            output: Vec::new(),
        }
    }

    fn drain(
        &mut self,
        receiver: &Receiver<Chunk>,
        mut open_streams: usize,
    ) -> Result<(), StreamFailure> {
        let started = Instant::now();
        while open_streams > 0 {
            let remaining = self
                .timeouts
                .deadline
                .checked_sub(started.elapsed())
                .ok_or(StreamFailure::Timeout(TimeoutKind::Deadline(
                    self.timeouts.deadline,
                )))?;
            let wait = remaining.min(self.timeouts.idle);

            match receiver.recv_timeout(wait) {
                Ok(Chunk::Data(bytes)) => self.output.extend_from_slice(&bytes),
                Ok(Chunk::Closed) => open_streams -= 1,
                Ok(Chunk::Failed(e)) => return Err(StreamFailure::Io(e)),
                Err(RecvTimeoutError::Timeout) => {
                    let kind = if remaining <= self.timeouts.idle {
                        TimeoutKind::Deadline(self.timeouts.deadline)
                    } else {
                        TimeoutKind::Idle(self.timeouts.idle)
                    };
                    return Err(StreamFailure::Timeout(kind));
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        Ok(())
    }

    fn into_output(self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}
