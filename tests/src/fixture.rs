//! On-disk projects for pipeline tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use aurora::Settings;
use serde_json::json;

use crate::paths::clean_dir;

/// A components directory and a project directory under a test's build directory.
pub struct Fixture {
    pub components: PathBuf,
    pub project: PathBuf,
}

impl Fixture {
    /// Creates empty component and project directories.
    pub fn new(test_name: &str) -> Self {
        let root = clean_dir(test_name);
        let components = root.join("components");
        let project = root.join("project");
        for dir in ["bin", "HDL", "Macros", "Scripts", "Temp"] {
            std::fs::create_dir_all(components.join(dir)).unwrap();
        }
        std::fs::write(components.join("Scripts").join("fix.vcd"), "").unwrap();
        std::fs::create_dir_all(&project).unwrap();
        Self {
            components,
            project,
        }
    }

    /// Settings with short timings.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::new(&self.components);
        settings.simulation.trace_poll = Duration::from_millis(10);
        settings.simulation.trace_timeout = Some(Duration::from_secs(10));
        let monitor = &mut settings.progress.monitor;
        monitor.poll_interval = Duration::from_millis(10);
        monitor.frame_interval = Duration::from_millis(1);
        monitor.step = 0.5;
        monitor.hold = Duration::from_millis(10);
        settings.progress.settle = Duration::from_secs(5);
        settings
    }

    pub fn temp(&self) -> PathBuf {
        self.components.join("Temp")
    }

    /// Writes `processorConfig.json`.
    pub fn processor_config(&self, config: serde_json::Value) {
        write(&self.project.join("processorConfig.json"), &config.to_string());
    }

    /// Writes `projectOriented.json`.
    pub fn project_config(&self, config: serde_json::Value) {
        write(&self.project.join("projectOriented.json"), &config.to_string());
    }

    /// Creates the source and compiled artifacts of a processor.
    pub fn processor(&self, name: &str, stem: &str) {
        let dir = self.project.join(name);
        write(
            &dir.join("Software").join(format!("{stem}.cmm")),
            "void main() {}\n",
        );
        write(&dir.join("Software").join(format!("{stem}.asm")), "");
        let hardware = dir.join("Hardware");
        write(&hardware.join(format!("{stem}.v")), "module cpu; endmodule\n");
        write(&hardware.join(format!("{stem}_data.mif")), "");
        write(&hardware.join(format!("{stem}_inst.mif")), "");
        std::fs::create_dir_all(dir.join("Simulation")).unwrap();
    }

    /// A single active processor `cpu` compiling `fir.cmm`.
    pub fn single_processor(&self, testbench: &str) {
        self.processor("cpu", "fir");
        self.processor_config(json!({
            "processors": [{
                "name": "cpu",
                "clk": 100,
                "numClocks": 5000,
                "cmmFile": "fir.cmm",
                "testbenchFile": testbench,
                "gtkwFile": "standard",
                "isActive": true
            }],
            "iverilogFlags": ["-g2012"]
        }));
    }
}

pub fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// A minimal testbench without a control block.
pub const TESTBENCH: &str = "module fir_tb;\n  reg clk;\nendmodule\n";
