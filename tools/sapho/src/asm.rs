use std::path::Path;
use std::process::Command;

use crate::flag;

/// An `appcomp` run expanding the assembly in place.
#[derive(Debug, Clone)]
pub struct AssemblyPreprocess<'a> {
    pub appcomp: &'a Path,
    pub asm: &'a Path,
    pub temp_dir: &'a Path,
}

impl AssemblyPreprocess<'_> {
    pub fn command(&self) -> Command {
        let mut command = Command::new(self.appcomp);
        command
            .arg(self.asm)
            .arg(self.temp_dir)
            .current_dir(self.temp_dir);
        command
    }
}

/// An `asmcomp` run generating the processor Verilog and memory images.
#[derive(Debug, Clone)]
pub struct AssemblyCompile<'a> {
    pub asmcomp: &'a Path,
    pub asm: &'a Path,
    pub project_dir: &'a Path,
    pub hdl_dir: &'a Path,
    pub macros_dir: &'a Path,
    pub temp_dir: &'a Path,
    /// Clock frequency; `0` lets the compiler pick its default.
    pub clock: u64,
    /// Simulated clock cycles; `0` lets the compiler pick its default.
    pub cycles: u64,
    /// Set when compiling one processor of a multi-processor project.
    pub project_mode: bool,
}

impl AssemblyCompile<'_> {
    pub fn command(&self) -> Command {
        let mut command = Command::new(self.asmcomp);
        command
            .arg(self.asm)
            .arg(self.project_dir)
            .arg(self.hdl_dir)
            .arg(self.macros_dir)
            .arg(self.temp_dir)
            .arg(self.clock.to_string())
            .arg(self.cycles.to_string())
            .arg(flag(self.project_mode))
            .current_dir(self.temp_dir);
        command
    }
}
