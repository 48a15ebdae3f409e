//! Spawning and supervising external toolchain processes.
//!
//! An [`Executor`] starts a [`Command`] and hands back a [`ProcessHandle`]
//! that exposes the process id immediately and streams output line by line
//! as it arrives. [`run`] drives a handle to completion while honoring a
//! [`CancellationToken`].

#![warn(missing_docs)]

use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub mod error;
pub mod fs;
mod local;

pub use local::LocalExecutor;

use crate::error::{Error, Result};

/// How long to keep draining a killed process for its exit event.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// The output stream a line came from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Stream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// A single line of process output, without its line terminator.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OutputLine {
    /// The stream the line was read from.
    pub stream: Stream,
    /// The line contents.
    pub text: String,
}

/// An event produced by a running process.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ProcessEvent {
    /// A line of output.
    Output(OutputLine),
    /// The process exited. Always the last event.
    ///
    /// Processes terminated by a signal report `-1`.
    Exited {
        /// The exit code.
        code: i32,
    },
}

/// A handle to a spawned process.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    events: mpsc::UnboundedReceiver<ProcessEvent>,
}

impl ProcessHandle {
    /// Creates a handle from a process id and its event stream.
    pub fn new(pid: u32, events: mpsc::UnboundedReceiver<ProcessEvent>) -> Self {
        Self { pid, events }
    }

    /// The operating system identifier of the process.
    #[inline]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Waits for the next event, returning `None` once the stream is exhausted.
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        self.events.recv().await
    }

    /// Forwards every output line to `sink` and returns the exit code.
    pub async fn wait(mut self, mut sink: impl FnMut(&OutputLine)) -> Result<i32> {
        while let Some(event) = self.events.recv().await {
            match event {
                ProcessEvent::Output(line) => sink(&line),
                ProcessEvent::Exited { code } => return Ok(code),
            }
        }
        Err(Error::Disconnected(self.pid))
    }
}

/// How a supervised process finished.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Completion {
    /// The process exited on its own with the given code.
    Exited(i32),
    /// The process was terminated because cancellation was requested.
    Canceled,
}

impl Completion {
    /// Returns `true` if the process exited with code 0.
    #[inline]
    pub fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

/// Starts and terminates external processes.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Starts `command` with stdin closed and both output streams captured.
    async fn spawn(&self, command: Command) -> Result<ProcessHandle>;

    /// Terminates the process with the given identifier.
    ///
    /// Killing a process that has already exited is not an error.
    async fn kill(&self, pid: u32) -> Result<()>;
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Arc<E> {
    async fn spawn(&self, command: Command) -> Result<ProcessHandle> {
        (**self).spawn(command).await
    }

    async fn kill(&self, pid: u32) -> Result<()> {
        (**self).kill(pid).await
    }
}

/// Runs `command` to completion, forwarding each output line to `sink` as it arrives.
///
/// Non-zero exit codes are reported through [`Completion::Exited`], not as errors.
/// If `cancel` fires, the process is killed by id and [`Completion::Canceled`]
/// is returned. Nothing is spawned if `cancel` has already fired.
pub async fn run(
    executor: &dyn Executor,
    command: Command,
    cancel: &CancellationToken,
    mut sink: impl FnMut(&OutputLine),
) -> Result<Completion> {
    if cancel.is_cancelled() {
        return Ok(Completion::Canceled);
    }
    let mut handle = executor.spawn(command).await?;
    let pid = handle.pid();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(pid, "canceling process");
                executor.kill(pid).await?;
                let drain = async {
                    while let Some(event) = handle.next_event().await {
                        match event {
                            ProcessEvent::Output(line) => sink(&line),
                            ProcessEvent::Exited { .. } => break,
                        }
                    }
                };
                if tokio::time::timeout(KILL_GRACE, drain).await.is_err() {
                    tracing::warn!(pid, "process did not report exit after kill");
                }
                return Ok(Completion::Canceled);
            }
            event = handle.next_event() => match event {
                Some(ProcessEvent::Output(line)) => sink(&line),
                Some(ProcessEvent::Exited { code }) => return Ok(Completion::Exited(code)),
                None => return Err(Error::Disconnected(pid)),
            }
        }
    }
}
