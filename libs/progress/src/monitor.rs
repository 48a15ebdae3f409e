use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use exec::fs::{Fs, LocalFs};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::state::{parse_sample, Phase, ProgressState};

/// Timing of a progress session.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorOptions {
    /// How often the progress file is read.
    pub poll_interval: Duration,
    /// How often the smoothed value advances.
    pub frame_interval: Duration,
    /// Fraction of the remaining distance covered per frame.
    pub step: f64,
    /// How long a completed session stays at 100 before going idle.
    pub hold: Duration,
    /// Upper bound on the length of a session.
    pub max_duration: Option<Duration>,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            frame_interval: Duration::from_millis(16),
            step: 0.08,
            hold: Duration::from_millis(3000),
            max_duration: None,
        }
    }
}

/// A point-in-time view of a progress session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// The session phase.
    pub phase: Phase,
    /// The latest raw sample.
    pub target: u8,
    /// The smoothed percentage.
    pub current: f64,
}

impl From<&ProgressState> for Snapshot {
    fn from(state: &ProgressState) -> Self {
        Self {
            phase: state.phase(),
            target: state.target(),
            current: state.current(),
        }
    }
}

/// How a progress session ended.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Outcome {
    /// Progress reached 100 and the hold period elapsed.
    Completed,
    /// The session was stopped before completing.
    Stopped,
    /// The session exceeded [`MonitorOptions::max_duration`].
    TimedOut,
}

/// Watches a progress file written by a running simulation.
pub struct ProgressMonitor {
    path: PathBuf,
    options: MonitorOptions,
    fs: Arc<dyn Fs>,
}

impl ProgressMonitor {
    /// Creates a monitor for the progress file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: MonitorOptions::default(),
            fs: Arc::new(LocalFs),
        }
    }

    /// Sets the session timing.
    pub fn with_options(mut self, options: MonitorOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the filesystem used to read the progress file.
    pub fn with_fs(mut self, fs: Arc<dyn Fs>) -> Self {
        self.fs = fs;
        self
    }

    /// The progress file being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes any stale progress file and starts a session in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> MonitorHandle {
        if let Err(e) = self.fs.remove_stale(&self.path) {
            tracing::warn!(path = ?self.path, error = %e, "failed to remove stale progress file");
        }
        let mut state = ProgressState::new(self.options.step);
        state.start();
        let (tx, rx) = watch::channel(Snapshot::from(&state));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(drive(self, state, tx, cancel.clone()));
        MonitorHandle {
            snapshots: rx,
            cancel,
            task: Some(task),
        }
    }

    fn read_sample(&self) -> io::Result<u8> {
        match self.fs.read_to_string(&self.path) {
            Ok(contents) => Ok(parse_sample(&contents).unwrap_or(0)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e),
        }
    }
}

async fn drive(
    monitor: ProgressMonitor,
    mut state: ProgressState,
    tx: watch::Sender<Snapshot>,
    cancel: CancellationToken,
) -> Outcome {
    let options = &monitor.options;
    let mut poll = time::interval(options.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut frame = time::interval(options.frame_interval);
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let deadline = options.max_duration.map(|d| Instant::now() + d);
    let timeout = async move {
        match deadline {
            Some(deadline) => time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(timeout);

    let mut sampling = true;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                state.stop();
                tx.send_replace(Snapshot::from(&state));
                return Outcome::Stopped;
            }
            _ = &mut timeout => {
                tracing::warn!(path = ?monitor.path, "progress monitor timed out");
                state.stop();
                tx.send_replace(Snapshot::from(&state));
                return Outcome::TimedOut;
            }
            _ = poll.tick(), if sampling => {
                match monitor.read_sample() {
                    Ok(sample) => sampling = state.observe(sample),
                    Err(e) => {
                        tracing::warn!(path = ?monitor.path, error = %e, "stopping progress sampling");
                        sampling = false;
                    }
                }
                tx.send_replace(Snapshot::from(&state));
            }
            _ = frame.tick() => {
                let completed = state.tick();
                tx.send_replace(Snapshot::from(&state));
                if completed {
                    tracing::debug!(path = ?monitor.path, "progress complete");
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = time::sleep(options.hold) => {}
                    }
                    state.finish();
                    tx.send_replace(Snapshot::from(&state));
                    return Outcome::Completed;
                }
            }
        }
    }
}

/// Controls a running progress session.
///
/// Dropping the handle stops the session.
#[derive(Debug)]
pub struct MonitorHandle {
    snapshots: watch::Receiver<Snapshot>,
    cancel: CancellationToken,
    task: Option<JoinHandle<Outcome>>,
}

impl MonitorHandle {
    /// The latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        *self.snapshots.borrow()
    }

    /// Returns a receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Stops the session and waits for its task to exit.
    pub async fn stop(mut self) -> Outcome {
        self.cancel.cancel();
        self.join().await
    }

    /// Waits up to `grace` for the session to complete, then stops it.
    pub async fn settle(mut self, grace: Duration) -> Outcome {
        let Some(task) = self.task.as_mut() else {
            return Outcome::Stopped;
        };
        match time::timeout(grace, task).await {
            Ok(result) => {
                self.task = None;
                result.unwrap_or(Outcome::Stopped)
            }
            Err(_) => {
                self.cancel.cancel();
                self.join().await
            }
        }
    }

    async fn join(&mut self) -> Outcome {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(Outcome::Stopped),
            None => Outcome::Stopped,
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
