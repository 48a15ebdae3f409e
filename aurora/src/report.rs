//! Stages, reporting and run reports.

use std::fmt::Display;

use diagnostics::{Severity, SeverityCounts};
use progress::{Outcome, Snapshot};

/// A compilation stage. Stages always run in declaration order.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Stage {
    /// C± compilation to assembly.
    SourceCompile,
    /// Assembly to hardware description and memory images.
    AssemblyCompile,
    /// Verilog elaboration.
    StructuralCompile,
    /// Simulation and waveform viewing.
    Simulate,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::SourceCompile,
        Stage::AssemblyCompile,
        Stage::StructuralCompile,
        Stage::Simulate,
    ];

    /// The output channel a stage logs to.
    pub fn channel(&self) -> Channel {
        match self {
            Stage::SourceCompile => Channel::Source,
            Stage::AssemblyCompile => Channel::Assembly,
            Stage::StructuralCompile => Channel::Structural,
            Stage::Simulate => Channel::Waveform,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::SourceCompile => "source-compile",
            Stage::AssemblyCompile => "assembly-compile",
            Stage::StructuralCompile => "structural-compile",
            Stage::Simulate => "simulate",
        };
        write!(f, "{name}")
    }
}

/// A destination for tool output.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Channel {
    Source,
    Assembly,
    Structural,
    Waveform,
    Synthesis,
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Channel::Source => "cmm",
            Channel::Assembly => "asm",
            Channel::Structural => "verilog",
            Channel::Waveform => "wave",
            Channel::Synthesis => "yosys",
        };
        write!(f, "{name}")
    }
}

/// Receives pipeline output and lifecycle notifications.
pub trait Reporter: Send + Sync {
    /// A classified line of tool output or a pipeline message.
    fn log_output(&self, channel: Channel, text: &str, severity: Severity);

    fn stage_start(&self, stage: Stage);

    fn stage_success(&self, stage: Stage);

    fn stage_error(&self, stage: Stage, message: &str);

    /// A new progress snapshot of a running simulation.
    fn progress(&self, _snapshot: &Snapshot) {}
}

/// A [`Reporter`] that forwards everything to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn log_output(&self, channel: Channel, text: &str, severity: Severity) {
        match severity.as_tracing_level() {
            tracing::Level::ERROR => tracing::error!(%channel, "{text}"),
            tracing::Level::WARN => tracing::warn!(%channel, "{text}"),
            tracing::Level::INFO => tracing::info!(%channel, "{text}"),
            _ => tracing::debug!(%channel, "{text}"),
        }
    }

    fn stage_start(&self, stage: Stage) {
        tracing::info!(%stage, "stage started");
    }

    fn stage_success(&self, stage: Stage) {
        tracing::info!(%stage, "stage succeeded");
    }

    fn stage_error(&self, stage: Stage, message: &str) {
        tracing::error!(%stage, "stage failed: {message}");
    }

    fn progress(&self, snapshot: &Snapshot) {
        tracing::trace!(phase = ?snapshot.phase, current = snapshot.current, "simulation progress");
    }
}

/// Which processors a run builds.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum RunMode {
    /// The single active processor.
    #[default]
    Processor,
    /// Every processor type of a multi-processor project.
    Project,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum StageStatus {
    #[default]
    NotRun,
    Succeeded,
    Failed,
    Canceled,
}

/// The result of one unit of work within a stage.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StepRecord {
    pub stage: Stage,
    /// The processor the step ran for, or `None` for project-wide steps.
    pub unit: Option<String>,
    pub status: StageStatus,
}

/// What a pipeline run did.
///
/// Returned on success and carried by [`Failure`](crate::error::Failure) otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub mode: RunMode,
    statuses: [StageStatus; 4],
    counts: [SeverityCounts; 4],
    pub steps: Vec<StepRecord>,
    /// Processors whose sources were compiled, in order.
    pub compiled: Vec<String>,
    pub simulator_pid: Option<u32>,
    pub viewer_pid: Option<u32>,
    pub progress: Option<Outcome>,
}

impl RunReport {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn status(&self, stage: Stage) -> StageStatus {
        self.statuses[stage.index()]
    }

    /// Returns `true` if the run reached and completed the simulate stage.
    pub fn succeeded(&self) -> bool {
        self.status(Stage::Simulate) == StageStatus::Succeeded
            && !self
                .statuses
                .iter()
                .any(|s| matches!(s, StageStatus::Failed | StageStatus::Canceled))
    }

    /// Classified output lines of the tools a stage ran.
    pub fn counts(&self, stage: Stage) -> SeverityCounts {
        self.counts[stage.index()]
    }

    pub(crate) fn set_counts(&mut self, stage: Stage, counts: SeverityCounts) {
        self.counts[stage.index()] = counts;
    }

    pub(crate) fn set(&mut self, stage: Stage, status: StageStatus) {
        self.statuses[stage.index()] = status;
    }

    pub(crate) fn record(&mut self, stage: Stage, unit: Option<&str>, status: StageStatus) {
        self.steps.push(StepRecord {
            stage,
            unit: unit.map(str::to_string),
            status,
        });
    }
}
