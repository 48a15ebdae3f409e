//! Instrumenting testbenches with trace dumping and progress reporting.
//!
//! The control block dumps every signal of the testbench, then writes
//! `10`, `20`, ... `100` to a progress file, waiting `delay` time units
//! between lines, and finishes the simulation.

use std::path::Path;
use std::sync::Arc;

use exec::fs::Fs;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tera::Context;

use crate::error::{Error, Result};
use crate::TEMPLATES;

/// Delay between progress steps when none is configured.
pub const DEFAULT_DELAY: f64 = 200000.0;

lazy_static! {
    static ref CONTROL_BLOCK: Regex =
        Regex::new(r"\s*integer\s+progress,\s+chrys;(?s:.*?)\$finish;\s*end\b").unwrap();
    static ref BLOCK_DELAY: Regex = Regex::new(r"(?m)^\s*#\s*([\d.]+)\s*;").unwrap();
    static ref ENDMODULE: Regex = Regex::new(r"\bendmodule\b").unwrap();
}

/// Parameters of the control block.
#[derive(Debug, Clone, Copy)]
pub struct SimControl<'a> {
    /// The testbench module, also the stem of the trace file.
    pub tb_module: &'a str,
    /// Directory the simulator writes `progress.txt` to.
    pub progress_dir: &'a Path,
    /// Time units between progress steps.
    pub delay: f64,
}

/// What [`TestbenchInjector::inject`] did to the testbench.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Injection {
    /// No control block was present; one was added.
    Inserted,
    /// The existing block had a different delay and was replaced.
    Replaced,
    /// The existing block already had the requested delay.
    Unchanged,
}

impl Injection {
    /// Returns `true` if the testbench file was rewritten.
    pub fn modified(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

#[derive(Serialize)]
struct ControlBlockContext<'a> {
    tb_module: &'a str,
    progress_path: String,
    delay: String,
}

/// Adds or updates the control block of testbench files.
pub struct TestbenchInjector {
    fs: Arc<dyn Fs>,
}

impl TestbenchInjector {
    pub fn new(fs: Arc<dyn Fs>) -> Self {
        Self { fs }
    }

    /// Ensures `testbench` contains a control block with the given parameters.
    ///
    /// An existing block is rewritten only if its delay differs from
    /// `control.delay`, so repeated calls write at most once.
    pub fn inject(&self, testbench: &Path, control: &SimControl) -> Result<Injection> {
        if !control.delay.is_finite() || control.delay < 0.0 {
            return Err(Error::InvalidDelay(control.delay));
        }
        let contents = self
            .fs
            .read_to_string(testbench)
            .map_err(Error::io(testbench))?;
        let block = format!("\n\n{}", render_control_block(control)?);

        let (updated, injection) = match CONTROL_BLOCK.find(&contents) {
            Some(existing) => {
                let current = BLOCK_DELAY
                    .captures(existing.as_str())
                    .and_then(|caps| caps[1].parse::<f64>().ok());
                if current.is_some_and(|d| same_delay(d, control.delay)) {
                    tracing::debug!(path = ?testbench, "control block up to date");
                    return Ok(Injection::Unchanged);
                }
                let updated = format!(
                    "{}{}{}",
                    &contents[..existing.start()],
                    block,
                    &contents[existing.end()..]
                );
                (updated, Injection::Replaced)
            }
            None => {
                let end = ENDMODULE
                    .find_iter(&contents)
                    .last()
                    .ok_or_else(|| Error::MissingEndmodule(testbench.to_path_buf()))?;
                let updated = format!(
                    "{}{}\n{}",
                    contents[..end.start()].trim_end(),
                    block,
                    &contents[end.start()..]
                );
                (updated, Injection::Inserted)
            }
        };

        self.fs
            .write(testbench, updated.as_bytes())
            .map_err(Error::io(testbench))?;
        tracing::info!(path = ?testbench, ?injection, delay = control.delay, "updated testbench control block");
        Ok(injection)
    }
}

/// Renders the control block without surrounding blank lines.
pub fn render_control_block(control: &SimControl) -> Result<String> {
    let progress_path = control
        .progress_dir
        .join("progress.txt")
        .display()
        .to_string()
        .replace('\\', "\\\\")
        .replace('"', "\\\"");
    let context = Context::from_serialize(ControlBlockContext {
        tb_module: control.tb_module,
        progress_path,
        delay: format_delay(control.delay),
    })?;
    let block = TEMPLATES.render("sim_control.v", &context)?;
    Ok(block.trim_end().to_string())
}

fn format_delay(delay: f64) -> String {
    if delay.fract() == 0.0 && delay < 1e15 {
        format!("{}", delay as u64)
    } else {
        delay.to_string()
    }
}

fn same_delay(a: f64, b: f64) -> bool {
    (a - b).abs() <= f64::EPSILON * a.abs().max(b.abs()).max(1.0)
}
