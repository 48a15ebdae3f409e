//! Command lines for the Icarus toolchain and GTKWave.

use std::path::{Path, PathBuf};
use std::process::Command;

/// An `iverilog` elaboration producing a `vvp` executable.
#[derive(Debug, Clone)]
pub struct Elaboration<'a> {
    pub iverilog: &'a Path,
    pub flags: &'a [String],
    /// Root module, usually the testbench.
    pub top: &'a str,
    pub output: &'a Path,
    pub sources: &'a [PathBuf],
    pub work_dir: &'a Path,
}

impl Elaboration<'_> {
    pub fn command(&self) -> Command {
        let mut command = Command::new(self.iverilog);
        command
            .args(self.flags)
            .arg("-s")
            .arg(self.top)
            .arg("-o")
            .arg(self.output)
            .args(self.sources)
            .current_dir(self.work_dir);
        command
    }
}

/// A `vvp` run of an elaborated design.
#[derive(Debug, Clone)]
pub struct Vvp<'a> {
    pub vvp: &'a Path,
    pub program: &'a Path,
    /// Directory the trace and progress files are written relative to.
    pub work_dir: &'a Path,
}

impl Vvp<'_> {
    pub fn command(&self) -> Command {
        let mut command = Command::new(self.vvp);
        command.arg(self.program).current_dir(self.work_dir);
        command
    }
}

/// A GTKWave window.
#[derive(Debug, Clone)]
pub struct GtkWave<'a> {
    pub gtkwave: &'a Path,
    /// A trace file or a saved `.gtkw` layout.
    pub target: &'a Path,
    /// Tcl script run after loading.
    pub script: Option<&'a Path>,
    pub work_dir: &'a Path,
}

impl GtkWave<'_> {
    pub fn command(&self) -> Command {
        let mut command = Command::new(self.gtkwave);
        command
            .args(["--rcvar", "hide_sst on", "--fastload", "--dark"])
            .arg(self.target);
        if let Some(script) = self.script {
            let mut arg = std::ffi::OsString::from("--script=");
            arg.push(script);
            command.arg(arg);
        }
        command.current_dir(self.work_dir);
        command
    }
}
