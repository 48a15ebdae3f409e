//! Build pipeline for SAPHO processor projects.
//!
//! [`Pipeline`] compiles a processor's C± program through assembly and
//! Verilog elaboration, then simulates it with the waveform viewer attached.
//! [`HierarchyRequest`] analyzes the instance hierarchy of a design.

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod paths;
pub mod pipeline;
pub mod report;
pub mod settings;

pub use config::{ProcessorConfig, ProcessorTarget, ProjectConfig, TestbenchRef, WaveformRef};
pub use error::{ConfigError, Error, Failure, Result};
pub use crate::hierarchy::HierarchyRequest;
pub use pipeline::Pipeline;
pub use report::{
    Channel, Reporter, RunMode, RunReport, Stage, StageStatus, StepRecord, TracingReporter,
};
pub use settings::{Settings, ToolchainLayout};
