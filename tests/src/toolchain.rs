//! A scripted stand-in for the external toolchain.
//!
//! [`ScriptedExecutor`] never starts real processes. Each spawn is recorded
//! and answered by the [`Behavior`] registered for the program's file stem;
//! unknown programs print nothing and exit with code 0.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use exec::{Executor, OutputLine, ProcessEvent, ProcessHandle, Stream};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A recorded spawn.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// File stem of the program, e.g. `iverilog`.
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub pid: u32,
    pub at: Instant,
}

/// How a scripted program behaves.
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    /// Lines printed to stdout immediately.
    pub output: Vec<String>,
    /// Files written before anything else happens.
    pub writes: Vec<(PathBuf, String)>,
    /// Files written after `delay`.
    pub late_writes: Vec<(PathBuf, String)>,
    pub delay: Duration,
    /// Keep running until killed.
    pub hang: bool,
    pub exit_code: i32,
}

impl Behavior {
    pub fn exit(code: i32) -> Self {
        Self {
            exit_code: code,
            ..Default::default()
        }
    }

    pub fn hang() -> Self {
        Self {
            hang: true,
            ..Default::default()
        }
    }

    pub fn print(mut self, line: impl Into<String>) -> Self {
        self.output.push(line.into());
        self
    }

    pub fn write(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.writes.push((path.into(), contents.into()));
        self
    }

    pub fn write_after(
        mut self,
        delay: Duration,
        path: impl Into<PathBuf>,
        contents: impl Into<String>,
    ) -> Self {
        self.delay = delay;
        self.late_writes.push((path.into(), contents.into()));
        self
    }
}

#[derive(Default)]
pub struct ScriptedExecutor {
    behaviors: Mutex<HashMap<String, Behavior>>,
    invocations: Mutex<Vec<Invocation>>,
    killed: Mutex<Vec<u32>>,
    running: Mutex<HashMap<u32, CancellationToken>>,
    next_pid: AtomicU32,
}

impl ScriptedExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_pid: AtomicU32::new(1000),
            ..Default::default()
        })
    }

    /// Sets the behavior of a program, by file stem.
    pub fn on(&self, program: &str, behavior: Behavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(program.to_string(), behavior);
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Total number of spawns.
    pub fn count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    /// Number of spawns of a program.
    pub fn count_of(&self, program: &str) -> usize {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.program == program)
            .count()
    }

    /// The programs spawned, in order.
    pub fn programs(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.program.clone())
            .collect()
    }

    pub fn invocation_of(&self, program: &str) -> Option<Invocation> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.program == program)
            .cloned()
    }

    pub fn killed(&self) -> Vec<u32> {
        self.killed.lock().unwrap().clone()
    }
}

fn write_file(path: &PathBuf, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn spawn(&self, command: Command) -> exec::error::Result<ProcessHandle> {
        let program = PathBuf::from(command.get_program())
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        let invocation = Invocation {
            program: program.clone(),
            args: command
                .get_args()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
            cwd: command.get_current_dir().map(|d| d.to_path_buf()),
            pid,
            at: Instant::now(),
        };
        tracing::debug!(?invocation, "scripted spawn");
        self.invocations.lock().unwrap().push(invocation);

        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(&program)
            .cloned()
            .unwrap_or_default();
        let killed = CancellationToken::new();
        self.running.lock().unwrap().insert(pid, killed.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            for (path, contents) in &behavior.writes {
                write_file(path, contents);
            }
            for line in &behavior.output {
                let _ = tx.send(ProcessEvent::Output(OutputLine {
                    stream: Stream::Stdout,
                    text: line.clone(),
                }));
            }
            let code = tokio::select! {
                _ = killed.cancelled() => -1,
                code = async {
                    tokio::time::sleep(behavior.delay).await;
                    for (path, contents) in &behavior.late_writes {
                        write_file(path, contents);
                    }
                    if behavior.hang {
                        std::future::pending::<()>().await;
                    }
                    behavior.exit_code
                } => code,
            };
            let _ = tx.send(ProcessEvent::Exited { code });
        });
        Ok(ProcessHandle::new(pid, rx))
    }

    async fn kill(&self, pid: u32) -> exec::error::Result<()> {
        self.killed.lock().unwrap().push(pid);
        if let Some(token) = self.running.lock().unwrap().get(&pid) {
            token.cancel();
        }
        Ok(())
    }
}

/// A notification received by a [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Line(aurora::Channel, String, diagnostics::Severity),
    Start(aurora::Stage),
    Success(aurora::Stage),
    Error(aurora::Stage, String),
}

/// Records everything a pipeline reports.
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<Report>>,
    progress: Mutex<Vec<progress::Snapshot>>,
}

impl RecordingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<progress::Snapshot> {
        self.progress.lock().unwrap().clone()
    }

    /// Lines logged with the given severity.
    pub fn lines_with(&self, severity: diagnostics::Severity) -> Vec<String> {
        self.reports()
            .into_iter()
            .filter_map(|r| match r {
                Report::Line(_, text, s) if s == severity => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl aurora::Reporter for RecordingReporter {
    fn log_output(&self, channel: aurora::Channel, text: &str, severity: diagnostics::Severity) {
        self.reports
            .lock()
            .unwrap()
            .push(Report::Line(channel, text.to_string(), severity));
    }

    fn stage_start(&self, stage: aurora::Stage) {
        self.reports.lock().unwrap().push(Report::Start(stage));
    }

    fn stage_success(&self, stage: aurora::Stage) {
        self.reports.lock().unwrap().push(Report::Success(stage));
    }

    fn stage_error(&self, stage: aurora::Stage, message: &str) {
        self.reports
            .lock()
            .unwrap()
            .push(Report::Error(stage, message.to_string()));
    }

    fn progress(&self, snapshot: &progress::Snapshot) {
        self.progress.lock().unwrap().push(*snapshot);
    }
}
