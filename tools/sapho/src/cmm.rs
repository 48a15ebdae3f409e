use std::path::Path;
use std::process::Command;

use crate::flag;

/// A `cmmcomp` run translating a source file to assembly.
#[derive(Debug, Clone)]
pub struct SourceCompile<'a> {
    pub cmmcomp: &'a Path,
    pub source: &'a Path,
    /// Base name of every derived artifact.
    pub stem: &'a str,
    /// The processor directory; assembly is written to its `Software` folder.
    pub project_dir: &'a Path,
    pub macros_dir: &'a Path,
    pub temp_dir: &'a Path,
    /// Expose arrays as individual signals in the waveform viewer.
    pub show_arrays: bool,
}

impl SourceCompile<'_> {
    pub fn command(&self) -> Command {
        let mut command = Command::new(self.cmmcomp);
        command
            .arg(self.source)
            .arg(self.stem)
            .arg(self.project_dir)
            .arg(self.macros_dir)
            .arg(self.temp_dir)
            .arg(flag(self.show_arrays))
            .current_dir(self.temp_dir);
        command
    }
}
