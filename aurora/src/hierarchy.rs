//! Design hierarchy and schematic requests.

use std::path::{Path, PathBuf};

use diagnostics::{classify_line, Severity};
use exec::fs::Fs;
use hierarchy::Tree;
use tokio_util::sync::CancellationToken;
use yosys::{HierarchyParams, SchematicParams};

use crate::config::{ProcessorConfig, ProjectConfig};
use crate::error::{Error, Result};
use crate::paths::{module_name, ProcessorPaths, ProjectPaths};
use crate::pipeline::Pipeline;
use crate::report::{Channel, RunMode};

/// The files, top module and output location of a hierarchy analysis.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HierarchyRequest {
    pub files: Vec<PathBuf>,
    pub top: String,
    pub json_path: PathBuf,
    /// Where Yosys runs and writes its script.
    pub work_dir: PathBuf,
}

impl HierarchyRequest {
    /// Derives the request for a project in the given mode.
    ///
    /// In processor mode the active processor's hardware module is analyzed
    /// together with the support library. In project mode the synthesizable
    /// files are analyzed from the top-level module.
    pub fn resolve(pipeline: &Pipeline, fs: &dyn Fs, project_root: &Path, mode: RunMode) -> Result<Self> {
        let layout = &pipeline.settings().layout;
        match mode {
            RunMode::Processor => {
                let config = ProcessorConfig::load(fs, project_root)?;
                let target = config.target(config.active()?, project_root)?;
                let paths = ProcessorPaths::for_target(project_root, layout, &target);
                let mut files = layout.support_files();
                files.push(paths.hardware_module());
                Ok(Self {
                    files,
                    top: paths.stem().to_string(),
                    json_path: paths.hierarchy_json(),
                    work_dir: paths.temp,
                })
            }
            RunMode::Project => {
                let project = ProjectConfig::load(fs, project_root)?;
                let paths = ProjectPaths::new(project_root, layout);
                Ok(Self {
                    files: project.synthesizable_paths(),
                    top: module_name(&project.top_level()?),
                    json_path: paths.hierarchy_json(),
                    work_dir: paths.temp,
                })
            }
        }
    }

    /// Runs Yosys and builds the instance tree from the top module.
    pub async fn analyze(&self, pipeline: &Pipeline, cancel: &CancellationToken) -> Result<Tree> {
        pipeline
            .fs()
            .create_dir_all(&self.work_dir)
            .map_err(Error::io(&self.work_dir))?;
        let layout = &pipeline.settings().layout;
        let reporter = pipeline.reporter();
        reporter.log_output(
            Channel::Synthesis,
            &format!("Analyzing hierarchy of {} ({} files)", self.top, self.files.len()),
            Severity::Plain,
        );

        let params = HierarchyParams {
            yosys: &layout.yosys,
            work_dir: &self.work_dir,
            files: &self.files,
            top: &self.top,
            json_path: &self.json_path,
        };
        let design = yosys::run_hierarchy(&params, &**pipeline.executor(), cancel, |line| {
            reporter.log_output(Channel::Synthesis, &line.text, classify_line(&line.text));
        })
        .await?;
        let tree = design
            .tree(&self.top)
            .map_err(|e| Error::Hierarchy(yosys::error::Error::Netlist(e)))?;
        tracing::info!(top = %self.top, nodes = tree.walk().len(), "built design hierarchy");
        Ok(tree)
    }

    /// Synthesizes and flattens the design, then draws it to `svg_path`.
    pub async fn schematic(
        &self,
        pipeline: &Pipeline,
        svg_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<()> {
        pipeline
            .fs()
            .create_dir_all(&self.work_dir)
            .map_err(Error::io(&self.work_dir))?;
        let layout = &pipeline.settings().layout;
        let reporter = pipeline.reporter();
        let json_path = self.json_path.with_file_name(format!("{}_schematic.json", self.top));
        let params = SchematicParams {
            yosys: &layout.yosys,
            netlistsvg: &layout.netlistsvg,
            work_dir: &self.work_dir,
            files: &self.files,
            top: &self.top,
            json_path: &json_path,
            svg_path,
        };
        yosys::run_schematic(&params, &**pipeline.executor(), cancel, |line| {
            reporter.log_output(Channel::Synthesis, &line.text, classify_line(&line.text));
        })
        .await?;
        reporter.log_output(
            Channel::Synthesis,
            &format!("Schematic written to {}", svg_path.display()),
            Severity::Success,
        );
        Ok(())
    }
}
