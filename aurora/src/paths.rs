//! The artifact naming convention.
//!
//! `P` is the project root, `N` the processor name, `S` the source file stem,
//! `C` the components root and `T` the temp directory `C/Temp`.

use std::path::{Path, PathBuf};

use crate::config::{ProcessorTarget, TestbenchRef};
use crate::settings::ToolchainLayout;

/// Paths of one processor's artifacts.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProcessorPaths {
    /// `P/N`
    pub dir: PathBuf,
    /// `T/N`
    pub temp: PathBuf,
    stem: String,
}

impl ProcessorPaths {
    pub fn new(project_root: &Path, layout: &ToolchainLayout, name: &str, stem: &str) -> Self {
        Self {
            dir: project_root.join(name),
            temp: layout.temp.join(name),
            stem: stem.to_string(),
        }
    }

    pub fn for_target(project_root: &Path, layout: &ToolchainLayout, target: &ProcessorTarget) -> Self {
        Self::new(project_root, layout, &target.name, target.stem())
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn software(&self) -> PathBuf {
        self.dir.join("Software")
    }

    pub fn hardware(&self) -> PathBuf {
        self.dir.join("Hardware")
    }

    pub fn simulation(&self) -> PathBuf {
        self.dir.join("Simulation")
    }

    /// `P/N/Software/S.asm`
    pub fn asm(&self) -> PathBuf {
        self.software().join(format!("{}.asm", self.stem))
    }

    /// `P/N/Hardware/S.v`
    pub fn hardware_module(&self) -> PathBuf {
        self.hardware().join(format!("{}.v", self.stem))
    }

    /// `P/N/Hardware/S_data.mif`
    pub fn data_mif(&self) -> PathBuf {
        self.hardware().join(format!("{}_data.mif", self.stem))
    }

    /// `P/N/Hardware/S_inst.mif`
    pub fn inst_mif(&self) -> PathBuf {
        self.hardware().join(format!("{}_inst.mif", self.stem))
    }

    /// Module name of the generated testbench.
    pub fn standard_tb_module(&self) -> String {
        format!("{}_tb", self.stem)
    }

    /// `P/N/Simulation/S_tb.v`
    pub fn standard_tb(&self) -> PathBuf {
        self.simulation().join(format!("{}.v", self.standard_tb_module()))
    }

    /// `T/N/S_tb.v`, written by the assembler.
    pub fn generated_tb(&self) -> PathBuf {
        self.temp.join(format!("{}.v", self.standard_tb_module()))
    }

    /// The testbench file and module a target is simulated with.
    pub fn testbench(&self, testbench: &TestbenchRef) -> (PathBuf, String) {
        match testbench {
            TestbenchRef::Standard => (self.standard_tb(), self.standard_tb_module()),
            TestbenchRef::File(path) => (path.clone(), module_name(path)),
        }
    }

    /// `T/N/S.vvp`
    pub fn vvp(&self) -> PathBuf {
        self.temp.join(format!("{}.vvp", self.stem))
    }

    /// `T/N/progress.txt`
    pub fn progress(&self) -> PathBuf {
        self.temp.join(PROGRESS_FILE)
    }

    /// `T/N/tcl_infos.txt`
    pub fn tcl_infos(&self) -> PathBuf {
        self.temp.join(TCL_INFOS_FILE)
    }

    /// `T/N/<tb module>.vcd`
    pub fn trace(&self, tb_module: &str) -> PathBuf {
        self.temp.join(format!("{tb_module}.vcd"))
    }

    /// `T/N/hierarchy.json`
    pub fn hierarchy_json(&self) -> PathBuf {
        self.temp.join("hierarchy.json")
    }
}

pub const PROGRESS_FILE: &str = "progress.txt";
pub const TCL_INFOS_FILE: &str = "tcl_infos.txt";
pub const FIX_VCD: &str = "fix.vcd";

/// Paths of project-wide artifacts.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    /// `T`
    pub temp: PathBuf,
    name: String,
}

impl ProjectPaths {
    pub fn new(project_root: &Path, layout: &ToolchainLayout) -> Self {
        let name = project_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        Self {
            root: project_root.to_path_buf(),
            temp: layout.temp.clone(),
            name,
        }
    }

    /// The project name, the base name of its root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `P/TopLevel`
    pub fn top_level_dir(&self) -> PathBuf {
        self.root.join("TopLevel")
    }

    /// `T/<project name>.vvp`
    pub fn vvp(&self) -> PathBuf {
        self.temp.join(format!("{}.vvp", self.name))
    }

    /// `T/progress.txt`
    pub fn progress(&self) -> PathBuf {
        self.temp.join(PROGRESS_FILE)
    }

    /// `T/tcl_infos.txt`
    pub fn tcl_infos(&self) -> PathBuf {
        self.temp.join(TCL_INFOS_FILE)
    }

    /// `T/<tb module>.vcd`
    pub fn trace(&self, tb_module: &str) -> PathBuf {
        self.temp.join(format!("{tb_module}.vcd"))
    }

    /// `T/project_hierarchy.json`
    pub fn hierarchy_json(&self) -> PathBuf {
        self.temp.join("project_hierarchy.json")
    }
}

/// The module name implied by a Verilog file name.
pub fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
