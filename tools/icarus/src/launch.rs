//! Running a simulator together with a waveform viewer.
//!
//! The viewer needs the trace file the simulator writes, but the simulator
//! keeps running long after the file is created. The launcher therefore
//! starts the simulator, polls for the trace file, and starts the viewer as
//! soon as the file exists. The simulator's exit code decides the outcome;
//! the viewer is detached and never awaited.

use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use exec::fs::Fs;
use exec::{Executor, OutputLine, ProcessEvent};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// When the viewer is started relative to the simulator.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    /// Start the viewer as soon as the trace file appears.
    #[default]
    Parallel,
    /// Start the viewer after the simulator exits.
    Serial,
}

/// Which process of the pair an event belongs to.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Source {
    Simulator,
    Viewer,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LaunchEventKind {
    Started { pid: u32 },
    Output(OutputLine),
    Completed { code: i32 },
    Error(String),
}

/// An event forwarded from the simulator or the viewer.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LaunchEvent {
    pub source: Source,
    pub kind: LaunchEventKind,
}

/// A simulator/viewer pair to launch.
#[derive(Debug)]
pub struct SimulationLaunch {
    pub simulator: Command,
    pub viewer: Command,
    /// The trace file written by the simulator and opened by the viewer.
    pub trace: PathBuf,
    pub mode: LaunchMode,
    pub poll_interval: Duration,
    /// How long to wait for the trace file after the simulator starts.
    pub trace_timeout: Option<Duration>,
}

/// A successful launch.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Launched {
    pub simulator_pid: u32,
    pub viewer_pid: u32,
}

pub struct ParallelSimulationLauncher {
    executor: Arc<dyn Executor>,
    fs: Arc<dyn Fs>,
}

impl ParallelSimulationLauncher {
    pub fn new(executor: Arc<dyn Executor>, fs: Arc<dyn Fs>) -> Self {
        Self { executor, fs }
    }

    /// Runs the simulator to completion, starting the viewer once the trace file exists.
    ///
    /// Output and lifecycle events of both processes are sent to `events`.
    /// Viewer events keep arriving after this returns, until the viewer exits.
    pub async fn launch(
        &self,
        launch: SimulationLaunch,
        events: &UnboundedSender<LaunchEvent>,
        cancel: &CancellationToken,
    ) -> Result<Launched> {
        if cancel.is_cancelled() {
            return Err(Error::Canceled);
        }
        let SimulationLaunch {
            simulator,
            viewer,
            trace,
            mode,
            poll_interval,
            trace_timeout,
        } = launch;

        let mut sim = self.executor.spawn(simulator).await?;
        let sim_pid = sim.pid();
        send(events, Source::Simulator, LaunchEventKind::Started { pid: sim_pid });
        tracing::debug!(pid = sim_pid, trace = ?trace, ?mode, "simulator started");

        let mut viewer = Some(viewer);
        let mut viewer_pid = None;
        let mut poll = time::interval(poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let deadline = trace_timeout.map(|t| Instant::now() + t);

        let code = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.kill(sim_pid).await;
                    if let Some(pid) = viewer_pid {
                        self.kill(pid).await;
                    }
                    return Err(Error::Canceled);
                }
                event = sim.next_event() => match event {
                    Some(ProcessEvent::Output(line)) => {
                        send(events, Source::Simulator, LaunchEventKind::Output(line));
                    }
                    Some(ProcessEvent::Exited { code }) => {
                        send(events, Source::Simulator, LaunchEventKind::Completed { code });
                        break code;
                    }
                    None => return Err(exec::error::Error::Disconnected(sim_pid).into()),
                },
                _ = poll.tick(), if mode == LaunchMode::Parallel && viewer.is_some() => {
                    if self.fs.exists(&trace) {
                        if let Some(command) = viewer.take() {
                            match self.start_viewer(command, events).await {
                                Ok(pid) => viewer_pid = Some(pid),
                                Err(e) => {
                                    self.kill(sim_pid).await;
                                    return Err(e);
                                }
                            }
                        }
                    } else if deadline.is_some_and(|d| Instant::now() >= d) {
                        tracing::error!(pid = sim_pid, trace = ?trace, "trace file did not appear");
                        self.kill(sim_pid).await;
                        return Err(Error::TraceTimeout(trace));
                    }
                }
            }
        };

        if code != 0 {
            return Err(Error::SimulatorFailed { code });
        }
        let viewer_pid = match (viewer_pid, viewer) {
            (Some(pid), _) => pid,
            (None, Some(command)) if self.fs.exists(&trace) => {
                self.start_viewer(command, events).await?
            }
            _ => return Err(Error::TraceMissing(trace)),
        };

        Ok(Launched {
            simulator_pid: sim_pid,
            viewer_pid,
        })
    }

    async fn start_viewer(
        &self,
        command: Command,
        events: &UnboundedSender<LaunchEvent>,
    ) -> Result<u32> {
        let mut handle = match self.executor.spawn(command).await {
            Ok(handle) => handle,
            Err(e) => {
                send(events, Source::Viewer, LaunchEventKind::Error(e.to_string()));
                return Err(e.into());
            }
        };
        let pid = handle.pid();
        send(events, Source::Viewer, LaunchEventKind::Started { pid });
        tracing::debug!(pid, "viewer started");

        let events = events.clone();
        tokio::spawn(async move {
            while let Some(event) = handle.next_event().await {
                let kind = match event {
                    ProcessEvent::Output(line) => LaunchEventKind::Output(line),
                    ProcessEvent::Exited { code } => LaunchEventKind::Completed { code },
                };
                send(&events, Source::Viewer, kind);
            }
        });
        Ok(pid)
    }

    async fn kill(&self, pid: u32) {
        if let Err(e) = self.executor.kill(pid).await {
            tracing::warn!(pid, error = %e, "failed to terminate process");
        }
    }
}

fn send(events: &UnboundedSender<LaunchEvent>, source: Source, kind: LaunchEventKind) {
    let _ = events.send(LaunchEvent { source, kind });
}
