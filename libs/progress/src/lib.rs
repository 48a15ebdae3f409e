//! Live progress for simulations that report through a side-channel file.
//!
//! The simulator appends percentages (`10`, `20`, ...) to a text file. A
//! [`ProgressMonitor`] polls that file, and a smoothed value chases the
//! latest sample at a fixed frame rate. [`ProgressState`] holds the pure
//! state machine so it can be driven without timers.

#![warn(missing_docs)]

mod monitor;
mod state;

pub use monitor::{MonitorHandle, MonitorOptions, Outcome, ProgressMonitor, Snapshot};
pub use state::{parse_sample, Phase, ProgressState, COMPLETE_THRESHOLD};
