//! Project configuration records.
//!
//! Two JSON files live at the root of every project:
//! `processorConfig.json` describes the processors and their sources, and
//! `projectOriented.json` describes a multi-processor project built around a
//! top-level module. Both are written by other tools; this module only reads
//! them, tolerating missing optional fields and numbers stored as strings.

use std::path::{Path, PathBuf};

use exec::fs::Fs;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;

use crate::error::ConfigError;

pub const PROCESSOR_CONFIG_FILE: &str = "processorConfig.json";
pub const PROJECT_CONFIG_FILE: &str = "projectOriented.json";

/// The value used by the configuration files to select a generated file.
const STANDARD: &str = "standard";

type Result<T> = std::result::Result<T, ConfigError>;

/// Contents of `processorConfig.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorConfig {
    pub processors: Vec<ProcessorRecord>,
    pub iverilog_flags: Vec<String>,
    /// Source file selected globally. Used when a processor has none of its own.
    pub selected_cmm_file: Option<String>,
}

/// A processor entry of `processorConfig.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorRecord {
    pub name: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub clk: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub num_clocks: u64,
    pub testbench_file: String,
    pub gtkw_file: String,
    pub cmm_file: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_active: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub show_arrays_in_gtkwave: bool,
}

impl Default for ProcessorRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            clk: 0,
            num_clocks: 0,
            testbench_file: STANDARD.to_string(),
            gtkw_file: STANDARD.to_string(),
            cmm_file: None,
            is_active: false,
            show_arrays_in_gtkwave: false,
        }
    }
}

/// A file entry of a project file list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileRecord {
    pub name: String,
    pub path: String,
    pub starred: bool,
}

/// A processor instance placed in a project.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessorInstance {
    #[serde(rename = "type")]
    pub processor_type: String,
    pub instance: String,
}

/// Contents of `projectOriented.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub top_level_file: String,
    pub testbench_file: String,
    pub gtkwave_file: String,
    pub synthesizable_files: Vec<FileRecord>,
    pub testbench_files: Vec<FileRecord>,
    pub gtkw_files: Vec<FileRecord>,
    pub processors: Vec<ProcessorInstance>,
    pub iverilog_flags: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub simu_delay: Option<f64>,
    #[serde(deserialize_with = "lenient_bool")]
    pub show_arrays_in_gtkwave: bool,
}

/// The testbench a processor is simulated with.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TestbenchRef {
    /// The testbench generated by the assembler, module `<stem>_tb`.
    Standard,
    /// A user-written testbench.
    File(PathBuf),
}

/// The waveform layout GTKWave opens.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum WaveformRef {
    /// Open the trace with the default initialization script.
    Standard,
    /// Open a saved `.gtkw` layout.
    File(PathBuf),
}

/// Everything needed to build one processor. Immutable for one run.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProcessorTarget {
    pub name: String,
    /// The selected source file.
    pub source: PathBuf,
    pub testbench: TestbenchRef,
    pub waveform: WaveformRef,
    pub clock: u64,
    /// Simulated clock cycles.
    pub cycles: u64,
    pub show_arrays: bool,
    pub active: bool,
}

impl ProcessorTarget {
    /// The source file name without its extension.
    ///
    /// Every generated artifact of the processor is named after it.
    pub fn stem(&self) -> &str {
        self.source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

impl ProcessorConfig {
    /// Reads `processorConfig.json` from the project root.
    pub fn load(fs: &dyn Fs, project_root: &Path) -> Result<Self> {
        load_json(fs, &project_root.join(PROCESSOR_CONFIG_FILE))
    }

    /// The first processor marked active.
    pub fn active(&self) -> Result<&ProcessorRecord> {
        self.processors
            .iter()
            .find(|p| p.is_active)
            .ok_or(ConfigError::NoActiveProcessor)
    }

    /// Looks up a processor by name.
    pub fn processor(&self, name: &str) -> Result<&ProcessorRecord> {
        self.processors
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::UnknownProcessor(name.to_string()))
    }

    /// Resolves a processor record into a build target rooted at `project_root`.
    ///
    /// Relative source files are looked up in `<project>/<name>/Software`,
    /// relative testbench and layout files in `<project>/<name>/Simulation`.
    pub fn target(&self, record: &ProcessorRecord, project_root: &Path) -> Result<ProcessorTarget> {
        let processor_dir = project_root.join(&record.name);
        let source = record
            .cmm_file
            .as_deref()
            .or(self.selected_cmm_file.as_deref())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::NoSourceFile(record.name.clone()))?;
        let simulation = processor_dir.join("Simulation");

        Ok(ProcessorTarget {
            name: record.name.clone(),
            source: resolve(&processor_dir.join("Software"), source),
            testbench: if is_standard(&record.testbench_file) {
                TestbenchRef::Standard
            } else {
                TestbenchRef::File(resolve(&simulation, &record.testbench_file))
            },
            waveform: if is_standard(&record.gtkw_file) {
                WaveformRef::Standard
            } else {
                WaveformRef::File(resolve(&simulation, &record.gtkw_file))
            },
            clock: record.clk,
            cycles: record.num_clocks,
            show_arrays: record.show_arrays_in_gtkwave,
            active: record.is_active,
        })
    }
}

impl ProjectConfig {
    /// Reads `projectOriented.json` from the project root.
    pub fn load(fs: &dyn Fs, project_root: &Path) -> Result<Self> {
        load_json(fs, &project_root.join(PROJECT_CONFIG_FILE))
    }

    /// The top-level design file.
    pub fn top_level(&self) -> Result<PathBuf> {
        starred(&self.synthesizable_files, "top-level", &self.top_level_file)?
            .ok_or(ConfigError::NoStarredFile("top-level"))
    }

    /// The project testbench.
    pub fn testbench(&self) -> Result<PathBuf> {
        starred(&self.testbench_files, "testbench", &self.testbench_file)?
            .ok_or(ConfigError::NoStarredFile("testbench"))
    }

    /// The waveform layout, or [`WaveformRef::Standard`] when none is selected.
    pub fn waveform(&self) -> Result<WaveformRef> {
        let saved = if is_standard(&self.gtkwave_file) {
            ""
        } else {
            self.gtkwave_file.as_str()
        };
        Ok(match starred(&self.gtkw_files, "waveform", saved)? {
            Some(path) => WaveformRef::File(path),
            None => WaveformRef::Standard,
        })
    }

    /// Compiler flags, split on whitespace.
    pub fn flags(&self) -> Vec<String> {
        self.iverilog_flags
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    pub fn synthesizable_paths(&self) -> Vec<PathBuf> {
        self.synthesizable_files
            .iter()
            .map(|f| PathBuf::from(&f.path))
            .collect()
    }
}

/// Returns the path of the single starred record, falling back to `saved`.
///
/// `Ok(None)` means nothing is starred and nothing was saved.
fn starred(files: &[FileRecord], role: &'static str, saved: &str) -> Result<Option<PathBuf>> {
    let mut starred = files.iter().filter(|f| f.starred);
    match (starred.next(), starred.next()) {
        (Some(file), None) => Ok(Some(PathBuf::from(&file.path))),
        (Some(_), Some(_)) => Err(ConfigError::AmbiguousStar(role)),
        (None, _) if saved.trim().is_empty() => Ok(None),
        (None, _) => Ok(Some(PathBuf::from(saved))),
    }
}

fn is_standard(value: &str) -> bool {
    value.trim().is_empty() || value.eq_ignore_ascii_case(STANDARD)
}

fn resolve(base: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_json<T: DeserializeOwned>(fs: &dyn Fs, path: &Path) -> Result<T> {
    if !fs.exists(path) {
        return Err(ConfigError::Missing(path.to_path_buf()));
    }
    let contents = fs.read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Bool(bool),
    Number(f64),
    Text(String),
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Number(n)) if n >= 0.0 => n as u64,
        Some(Lenient::Text(s)) => s.trim().parse::<f64>().map_or(0, |n| n.max(0.0) as u64),
        _ => 0,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error> {
    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Number(n)) => Some(n),
        Some(Lenient::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Bool(b)) => b,
        Some(Lenient::Number(n)) => n != 0.0,
        Some(Lenient::Text(s)) => matches!(s.trim(), "true" | "1"),
        None => false,
    })
}
