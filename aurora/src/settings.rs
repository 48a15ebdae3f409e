//! Toolchain layout and behavioral settings.
//!
//! Settings are read from an optional `Aurora.toml` at the components root.
//! Every key is optional; a missing file yields the defaults.
//!
//! ```toml
//! [toolchain]
//! yosys = "/usr/bin/yosys"
//! support_library = ["core.v", "ula.v"]
//!
//! [simulation]
//! launch_mode = "serial"
//! trace_timeout_secs = 120
//!
//! [progress]
//! hold_ms = 1000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use exec::fs::Fs;
use icarus::LaunchMode;
use progress::MonitorOptions;
use serde::Deserialize;

use crate::error::ConfigError;

pub const SETTINGS_FILE: &str = "Aurora.toml";

const EXE_SUFFIX: &str = std::env::consts::EXE_SUFFIX;

/// The processor HDL files elaborated with every design.
pub const SUPPORT_LIBRARY: [&str; 6] = [
    "addr_dec.v",
    "core.v",
    "instr_dec.v",
    "myFIFO.v",
    "processor.v",
    "ula.v",
];

/// Raw contents of `Aurora.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub toolchain: ToolchainOverrides,
    pub simulation: SimulationFile,
    pub progress: ProgressFile,
}

/// Overrides of toolchain locations. Relative paths are relative to the components root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainOverrides {
    pub cmmcomp: Option<PathBuf>,
    pub appcomp: Option<PathBuf>,
    pub asmcomp: Option<PathBuf>,
    pub iverilog: Option<PathBuf>,
    pub vvp: Option<PathBuf>,
    pub gtkwave: Option<PathBuf>,
    pub yosys: Option<PathBuf>,
    pub netlistsvg: Option<PathBuf>,
    pub macros: Option<PathBuf>,
    pub hdl: Option<PathBuf>,
    pub temp: Option<PathBuf>,
    pub scripts: Option<PathBuf>,
    pub support_library: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationFile {
    pub launch_mode: Option<LaunchMode>,
    /// Delay between progress reports when none is configured.
    pub default_delay: Option<f64>,
    pub trace_poll_ms: Option<u64>,
    /// Zero disables the limit.
    pub trace_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgressFile {
    pub poll_ms: Option<u64>,
    pub frame_ms: Option<u64>,
    pub step: Option<f64>,
    pub hold_ms: Option<u64>,
    pub settle_ms: Option<u64>,
}

/// Locations of the toolchain executables and shared directories.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ToolchainLayout {
    pub root: PathBuf,
    pub cmmcomp: PathBuf,
    pub appcomp: PathBuf,
    pub asmcomp: PathBuf,
    pub iverilog: PathBuf,
    pub vvp: PathBuf,
    pub gtkwave: PathBuf,
    pub yosys: PathBuf,
    pub netlistsvg: PathBuf,
    pub bin: PathBuf,
    pub macros: PathBuf,
    pub hdl: PathBuf,
    pub temp: PathBuf,
    pub scripts: PathBuf,
    pub support_library: Vec<String>,
}

impl ToolchainLayout {
    /// The default layout of a components directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_overrides(root, &ToolchainOverrides::default())
    }

    pub fn with_overrides(root: impl Into<PathBuf>, overrides: &ToolchainOverrides) -> Self {
        let root = root.into();
        let exe = |path: PathBuf| {
            let mut path = path.into_os_string();
            path.push(EXE_SUFFIX);
            PathBuf::from(path)
        };
        let pick = |value: &Option<PathBuf>, default: PathBuf| match value {
            Some(path) => root.join(path),
            None => default,
        };
        let bin = root.join("bin");
        let iverilog_bin = root.join("Packages").join("iverilog").join("bin");

        Self {
            cmmcomp: pick(&overrides.cmmcomp, exe(bin.join("cmmcomp"))),
            appcomp: pick(&overrides.appcomp, exe(bin.join("appcomp"))),
            asmcomp: pick(&overrides.asmcomp, exe(bin.join("asmcomp"))),
            iverilog: pick(&overrides.iverilog, exe(iverilog_bin.join("iverilog"))),
            vvp: pick(&overrides.vvp, exe(iverilog_bin.join("vvp"))),
            gtkwave: pick(
                &overrides.gtkwave,
                exe(root
                    .join("Packages")
                    .join("iverilog")
                    .join("gtkwave")
                    .join("bin")
                    .join("gtkwave")),
            ),
            yosys: pick(
                &overrides.yosys,
                exe(root.join("Packages").join("PRISM").join("yosys").join("yosys")),
            ),
            netlistsvg: overrides
                .netlistsvg
                .as_ref()
                .map(|p| root.join(p))
                .unwrap_or_else(|| PathBuf::from("netlistsvg")),
            macros: pick(&overrides.macros, root.join("Macros")),
            hdl: pick(&overrides.hdl, root.join("HDL")),
            temp: pick(&overrides.temp, root.join("Temp")),
            scripts: pick(&overrides.scripts, root.join("Scripts")),
            support_library: overrides
                .support_library
                .clone()
                .unwrap_or_else(|| SUPPORT_LIBRARY.iter().map(|s| s.to_string()).collect()),
            bin,
            root,
        }
    }

    /// Full paths of the support library files.
    pub fn support_files(&self) -> Vec<PathBuf> {
        self.support_library.iter().map(|f| self.hdl.join(f)).collect()
    }

    pub fn script(&self, name: &str) -> PathBuf {
        self.scripts.join(name)
    }
}

/// How simulations are launched.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    pub launch_mode: LaunchMode,
    pub default_delay: f64,
    pub trace_poll: Duration,
    pub trace_timeout: Option<Duration>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            launch_mode: LaunchMode::Parallel,
            default_delay: icarus::DEFAULT_DELAY,
            trace_poll: Duration::from_millis(500),
            trace_timeout: Some(Duration::from_secs(600)),
        }
    }
}

/// Progress monitor timings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSettings {
    pub monitor: MonitorOptions,
    /// How long a successful run waits for the animation to finish.
    pub settle: Duration,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            monitor: MonitorOptions::default(),
            settle: Duration::from_secs(10),
        }
    }
}

/// Resolved settings for a pipeline.
#[derive(Debug, Clone)]
pub struct Settings {
    pub layout: ToolchainLayout,
    pub simulation: SimulationSettings,
    pub progress: ProgressSettings,
}

impl Settings {
    /// Default settings for a components root.
    pub fn new(components_root: impl Into<PathBuf>) -> Self {
        Self {
            layout: ToolchainLayout::new(components_root),
            simulation: SimulationSettings::default(),
            progress: ProgressSettings::default(),
        }
    }

    /// Reads `Aurora.toml` from the components root, if present.
    pub fn load(fs: &dyn Fs, components_root: &Path) -> Result<Self, ConfigError> {
        let path = components_root.join(SETTINGS_FILE);
        if !fs.exists(&path) {
            tracing::debug!(path = ?path, "no settings file, using defaults");
            return Ok(Self::new(components_root));
        }
        let contents = fs
            .read_to_string(&path)
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        let file: SettingsFile = toml::from_str(&contents)
            .map_err(|source| ConfigError::Settings { path, source })?;
        Ok(Self::from_file(components_root, &file))
    }

    pub fn from_file(components_root: impl Into<PathBuf>, file: &SettingsFile) -> Self {
        let mut settings = Self {
            layout: ToolchainLayout::with_overrides(components_root, &file.toolchain),
            simulation: SimulationSettings::default(),
            progress: ProgressSettings::default(),
        };

        let sim = &file.simulation;
        let simulation = &mut settings.simulation;
        if let Some(mode) = sim.launch_mode {
            simulation.launch_mode = mode;
        }
        if let Some(delay) = sim.default_delay {
            simulation.default_delay = delay;
        }
        if let Some(ms) = sim.trace_poll_ms {
            simulation.trace_poll = Duration::from_millis(ms.max(1));
        }
        if let Some(secs) = sim.trace_timeout_secs {
            simulation.trace_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        let file = &file.progress;
        let progress = &mut settings.progress;
        if let Some(ms) = file.poll_ms {
            progress.monitor.poll_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = file.frame_ms {
            progress.monitor.frame_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(step) = file.step {
            progress.monitor.step = step;
        }
        if let Some(ms) = file.hold_ms {
            progress.monitor.hold = Duration::from_millis(ms);
        }
        if let Some(ms) = file.settle_ms {
            progress.settle = Duration::from_millis(ms);
        }
        settings
    }
}
