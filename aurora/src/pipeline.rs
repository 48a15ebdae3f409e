//! The compilation pipeline.
//!
//! A run takes a processor (or every processor type of a project) through
//! source compilation, assembly, elaboration and simulation. Each stage
//! starts only after the previous one succeeded; the first failure stops
//! the run and leaves every artifact in place for inspection.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use diagnostics::{classify_line, Severity};
use exec::fs::{Fs, LocalFs};
use exec::{Completion, Executor, LocalExecutor};
use icarus::{
    Elaboration, GtkWave, LaunchEvent, LaunchEventKind, ParallelSimulationLauncher, SimControl,
    SimulationLaunch, Source, TestbenchInjector, Vvp,
};
use itertools::Itertools;
use progress::ProgressMonitor;
use sapho::{AssemblyCompile, AssemblyPreprocess, SourceCompile};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::{ProcessorConfig, ProcessorTarget, ProjectConfig, TestbenchRef, WaveformRef};
use crate::error::{Error, Failure, Result};
use crate::paths::{module_name, ProcessorPaths, ProjectPaths, FIX_VCD};
use crate::report::{Channel, Reporter, RunMode, RunReport, Stage, StageStatus, TracingReporter};
use crate::settings::Settings;

const PROCESSOR_INIT_SCRIPT: &str = "gtk_proc_init.tcl";
const PROJECT_INIT_SCRIPT: &str = "gtk_proj_init.tcl";
const LAYOUT_SCRIPT: &str = "pos_gtkw.tcl";

/// Runs the toolchain for a project.
///
/// Configuration is read fresh from the project on every [`Pipeline::run`].
pub struct Pipeline {
    settings: Settings,
    executor: Arc<dyn Executor>,
    fs: Arc<dyn Fs>,
    reporter: Arc<dyn Reporter>,
}

impl Pipeline {
    /// A pipeline running local processes and logging through `tracing`.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            executor: Arc::new(LocalExecutor::new()),
            fs: Arc::new(LocalFs),
            reporter: Arc::new(TracingReporter),
        }
    }

    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_fs(mut self, fs: Arc<dyn Fs>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    pub fn fs(&self) -> &Arc<dyn Fs> {
        &self.fs
    }

    /// Builds and simulates the project at `project_root`.
    ///
    /// If `cancel` fires, the running process is terminated and the run
    /// fails with [`Error::Canceled`], even if a stage failed at the same time.
    pub async fn run(
        &self,
        project_root: &Path,
        mode: RunMode,
        cancel: &CancellationToken,
    ) -> std::result::Result<RunReport, Failure> {
        tracing::info!(project = ?project_root, ?mode, "starting pipeline run");
        let mut run = Run {
            pipeline: self,
            root: project_root,
            cancel,
            report: RunReport::new(mode),
            current: None,
            reported: false,
        };
        let result = match mode {
            RunMode::Processor => run.processor().await,
            RunMode::Project => run.project().await,
        };

        match result {
            Ok(()) => {
                tracing::info!(project = ?project_root, "pipeline run finished");
                Ok(run.report)
            }
            Err(error) => {
                let error = if cancel.is_cancelled() {
                    Error::Canceled
                } else {
                    error
                };
                if error.is_canceled() {
                    if let Some(stage) = run.current {
                        run.report.set(stage, StageStatus::Canceled);
                    }
                    let channel = run.current.map_or(Channel::Source, |s| s.channel());
                    self.reporter
                        .log_output(channel, "Compilation canceled", Severity::Warning);
                } else {
                    tracing::error!(error = %describe(&error), "pipeline run failed");
                    if !run.reported {
                        let channel = run.current.map_or(Channel::Source, |s| s.channel());
                        self.reporter
                            .log_output(channel, &describe(&error), Severity::Error);
                    }
                }
                Err(Failure {
                    report: run.report,
                    error,
                })
            }
        }
    }
}

/// State of a single run.
struct Run<'a> {
    pipeline: &'a Pipeline,
    root: &'a Path,
    cancel: &'a CancellationToken,
    report: RunReport,
    current: Option<Stage>,
    /// A stage failure was already handed to the reporter.
    reported: bool,
}

impl Run<'_> {
    async fn processor(&mut self) -> Result<()> {
        self.check_cancel()?;
        let pipeline = self.pipeline;
        let fs = &*pipeline.fs;
        let layout = &pipeline.settings.layout;

        let config = ProcessorConfig::load(fs, self.root)?;
        let target = config.target(config.active()?, self.root)?;
        let paths = ProcessorPaths::for_target(self.root, layout, &target);
        tracing::debug!(processor = %target.name, source = ?target.source, "resolved active processor");
        self.prepare_temp(&paths.temp)?;

        let unit = Some(target.name.as_str());
        self.begin(Stage::SourceCompile)?;
        let result = self.source_compile(&target, &paths).await;
        self.finish(Stage::SourceCompile, unit, result)?;

        self.begin(Stage::AssemblyCompile)?;
        let result = self.assembly_compile(&target, &paths, false).await;
        let result = match result {
            Ok(()) if target.testbench == TestbenchRef::Standard => self.keep_generated_testbench(&paths),
            other => other,
        };
        self.finish(Stage::AssemblyCompile, unit, result)?;

        self.begin(Stage::StructuralCompile)?;
        let result = self
            .structural_compile(Stage::StructuralCompile, &target, &paths, &config.iverilog_flags)
            .await;
        self.finish(Stage::StructuralCompile, unit, result)?;

        self.begin(Stage::Simulate)?;
        let result = self.simulate_processor(&target, &paths, &config.iverilog_flags).await;
        self.finish(Stage::Simulate, unit, result)
    }

    async fn project(&mut self) -> Result<()> {
        self.check_cancel()?;
        let pipeline = self.pipeline;
        let fs = &*pipeline.fs;
        let layout = &pipeline.settings.layout;

        let project = ProjectConfig::load(fs, self.root)?;
        let paths = ProjectPaths::new(self.root, layout);
        let testbench = project.testbench()?;
        let waveform = project.waveform()?;

        let mut targets = Vec::new();
        if !project.processors.is_empty() {
            let config = ProcessorConfig::load(fs, self.root)?;
            let mut seen = HashSet::new();
            for instance in &project.processors {
                let processor_type = instance.processor_type.as_str();
                if !seen.insert(processor_type) {
                    self.say(
                        Channel::Source,
                        &format!("Skipping duplicate processor type: {processor_type}"),
                        Severity::Info,
                    );
                    continue;
                }
                let mut target = config.target(config.processor(processor_type)?, self.root)?;
                target.show_arrays = project.show_arrays_in_gtkwave;
                targets.push(target);
            }
        }

        for target in &targets {
            self.check_cancel()?;
            let processor_paths = ProcessorPaths::for_target(self.root, layout, target);
            self.say(
                Channel::Source,
                &format!("Processing {}...", target.name),
                Severity::Plain,
            );
            self.prepare_temp(&processor_paths.temp)?;

            let unit = Some(target.name.as_str());
            self.begin(Stage::SourceCompile)?;
            let result = self.source_compile(target, &processor_paths).await;
            self.finish(Stage::SourceCompile, unit, result)?;

            self.begin(Stage::AssemblyCompile)?;
            let result = self.assembly_compile(target, &processor_paths, true).await;
            self.finish(Stage::AssemblyCompile, unit, result)?;
        }

        self.begin(Stage::StructuralCompile)?;
        let result = self
            .project_structural_compile(&project, &paths, &testbench, &targets)
            .await;
        self.finish(Stage::StructuralCompile, None, result)?;

        self.begin(Stage::Simulate)?;
        let result = self
            .simulate_project(&project, &paths, &testbench, &waveform)
            .await;
        self.finish(Stage::Simulate, None, result)
    }

    async fn source_compile(&mut self, target: &ProcessorTarget, paths: &ProcessorPaths) -> Result<()> {
        let pipeline = self.pipeline;
        let layout = &pipeline.settings.layout;
        let command = SourceCompile {
            cmmcomp: &layout.cmmcomp,
            source: &target.source,
            stem: target.stem(),
            project_dir: &paths.dir,
            macros_dir: &layout.macros,
            temp_dir: &paths.temp,
            show_arrays: target.show_arrays,
        }
        .command();
        self.exec(Stage::SourceCompile, "cmmcomp", command).await?;
        self.report.compiled.push(target.name.clone());
        Ok(())
    }

    async fn assembly_compile(
        &mut self,
        target: &ProcessorTarget,
        paths: &ProcessorPaths,
        project_mode: bool,
    ) -> Result<()> {
        let pipeline = self.pipeline;
        let layout = &pipeline.settings.layout;
        let asm = paths.asm();
        let command = AssemblyPreprocess {
            appcomp: &layout.appcomp,
            asm: &asm,
            temp_dir: &paths.temp,
        }
        .command();
        self.exec(Stage::AssemblyCompile, "appcomp", command).await?;

        let command = AssemblyCompile {
            asmcomp: &layout.asmcomp,
            asm: &asm,
            project_dir: &paths.dir,
            hdl_dir: &layout.hdl,
            macros_dir: &layout.macros,
            temp_dir: &paths.temp,
            clock: target.clock,
            cycles: target.cycles,
            project_mode,
        }
        .command();
        self.exec(Stage::AssemblyCompile, "asmcomp", command).await
    }

    /// Copies the testbench generated by the assembler into the project.
    fn keep_generated_testbench(&self, paths: &ProcessorPaths) -> Result<()> {
        let fs = &*self.pipeline.fs;
        let (from, to) = (paths.generated_tb(), paths.standard_tb());
        fs.create_dir_all(&paths.simulation())
            .map_err(Error::io(paths.simulation()))?;
        fs.copy(&from, &to).map_err(Error::io(&from))?;
        self.say(
            Channel::Assembly,
            &format!("Testbench updated in project folder: {}", to.display()),
            Severity::Info,
        );
        Ok(())
    }

    async fn structural_compile(
        &mut self,
        stage: Stage,
        target: &ProcessorTarget,
        paths: &ProcessorPaths,
        flags: &[String],
    ) -> Result<()> {
        let pipeline = self.pipeline;
        let layout = &pipeline.settings.layout;
        let (tb_file, tb_module) = paths.testbench(&target.testbench);
        let mut sources = vec![tb_file, paths.hardware_module()];
        sources.extend(layout.support_files());
        let vvp = paths.vvp();
        let command = Elaboration {
            iverilog: &layout.iverilog,
            flags,
            top: &tb_module,
            output: &vvp,
            sources: &sources,
            work_dir: &layout.hdl,
        }
        .command();
        self.exec(stage, "iverilog", command).await?;

        let fs = &*self.pipeline.fs;
        for mif in [paths.data_mif(), paths.inst_mif()] {
            let Some(name) = mif.file_name() else {
                continue;
            };
            fs.copy(&mif, &paths.temp.join(name)).map_err(Error::io(&mif))?;
        }
        Ok(())
    }

    async fn simulate_processor(
        &mut self,
        target: &ProcessorTarget,
        paths: &ProcessorPaths,
        flags: &[String],
    ) -> Result<()> {
        let pipeline = self.pipeline;
        let settings = &pipeline.settings;
        let layout = &settings.layout;
        let fs = &*pipeline.fs;
        let (tb_file, tb_module) = paths.testbench(&target.testbench);

        if let TestbenchRef::File(_) = target.testbench {
            let delay = if target.cycles > 0 {
                target.cycles as f64
            } else {
                settings.simulation.default_delay
            };
            self.inject(&tb_file, &tb_module, &paths.temp, delay)?;
        }
        self.structural_compile(Stage::Simulate, target, paths, flags)
            .await?;

        let tcl_infos = paths.tcl_infos();
        let contents = format!("{}\n{}\n", paths.temp.display(), layout.bin.display());
        fs.write(&tcl_infos, contents.as_bytes())
            .map_err(Error::io(&tcl_infos))?;

        let trace = paths.trace(&tb_module);
        fs.remove_stale(&trace).map_err(Error::io(&trace))?;

        let vvp = paths.vvp();
        let simulator = Vvp {
            vvp: &layout.vvp,
            program: &vvp,
            work_dir: &paths.temp,
        }
        .command();
        let (view_target, script) = match &target.waveform {
            WaveformRef::Standard => (trace.clone(), layout.script(PROCESSOR_INIT_SCRIPT)),
            WaveformRef::File(layout_file) => (layout_file.clone(), layout.script(LAYOUT_SCRIPT)),
        };
        let viewer = GtkWave {
            gtkwave: &layout.gtkwave,
            target: &view_target,
            script: Some(&script),
            work_dir: &paths.temp,
        }
        .command();

        self.launch(simulator, viewer, trace, paths.progress()).await
    }

    async fn project_structural_compile(
        &mut self,
        project: &ProjectConfig,
        paths: &ProjectPaths,
        testbench: &Path,
        targets: &[ProcessorTarget],
    ) -> Result<()> {
        self.elaborate_project(Stage::StructuralCompile, project, paths, testbench)
            .await?;

        let fs = &*self.pipeline.fs;
        for target in targets {
            let name = &target.name;
            let generated = paths.temp.join(name).join(format!("{name}_tb.v"));
            if !fs.exists(&generated) {
                continue;
            }
            let destination = self
                .root
                .join(name)
                .join("Simulation")
                .join(format!("{name}_tb.v"));
            match fs.copy(&generated, &destination) {
                Ok(()) => self.say(
                    Channel::Structural,
                    &format!("Copied testbench for {name} to Simulation folder"),
                    Severity::Plain,
                ),
                Err(e) => self.say(
                    Channel::Structural,
                    &format!("Warning: Could not copy testbench for {name}: {e}"),
                    Severity::Warning,
                ),
            }
        }
        Ok(())
    }

    async fn elaborate_project(
        &mut self,
        stage: Stage,
        project: &ProjectConfig,
        paths: &ProjectPaths,
        testbench: &Path,
    ) -> Result<()> {
        let pipeline = self.pipeline;
        let layout = &pipeline.settings.layout;
        let mut sources = project.synthesizable_paths();
        if sources.is_empty() {
            return Err(Error::stage(stage, "no synthesizable files defined"));
        }
        sources.extend(layout.support_files());
        sources.push(testbench.to_path_buf());

        let vvp = paths.vvp();
        let flags = project.flags();
        let command = Elaboration {
            iverilog: &layout.iverilog,
            flags: &flags,
            top: &module_name(testbench),
            output: &vvp,
            sources: &sources,
            work_dir: &paths.temp,
        }
        .command();
        self.exec(stage, "iverilog", command).await
    }

    async fn simulate_project(
        &mut self,
        project: &ProjectConfig,
        paths: &ProjectPaths,
        testbench: &Path,
        waveform: &WaveformRef,
    ) -> Result<()> {
        let pipeline = self.pipeline;
        let settings = &pipeline.settings;
        let layout = &settings.layout;
        let fs = &*pipeline.fs;
        let tb_module = module_name(testbench);

        fs.create_dir_all(&paths.temp).map_err(Error::io(&paths.temp))?;
        let tb_copy = match testbench.file_name() {
            Some(name) => paths.temp.join(name),
            None => return Err(Error::stage(Stage::Simulate, "testbench path has no file name")),
        };
        fs.copy(testbench, &tb_copy).map_err(Error::io(testbench))?;
        let delay = project
            .simu_delay
            .filter(|delay| *delay > 0.0)
            .unwrap_or(settings.simulation.default_delay);
        self.inject(&tb_copy, &tb_module, &paths.temp, delay)?;
        self.elaborate_project(Stage::Simulate, project, paths, &tb_copy)
            .await?;

        self.stage_project_files(project, paths);

        let instances = project.processors.iter().map(|p| &p.instance).join(" ");
        let types = project
            .processors
            .iter()
            .map(|p| &p.processor_type)
            .join(" ");
        let tcl_infos = paths.tcl_infos();
        let contents = format!(
            "{instances}\n{types}\n{}\n{}\n{}\n",
            paths.temp.display(),
            layout.bin.display(),
            layout.scripts.display()
        );
        fs.write(&tcl_infos, contents.as_bytes())
            .map_err(Error::io(&tcl_infos))?;

        let trace = paths.trace(&tb_module);
        fs.remove_stale(&trace).map_err(Error::io(&trace))?;

        let vvp = paths.vvp();
        let simulator = Vvp {
            vvp: &layout.vvp,
            program: &vvp,
            work_dir: &paths.temp,
        }
        .command();
        let (view_target, script) = match waveform {
            WaveformRef::Standard => (trace.clone(), layout.script(PROJECT_INIT_SCRIPT)),
            WaveformRef::File(layout_file) => (layout_file.clone(), layout.script(LAYOUT_SCRIPT)),
        };
        let viewer = GtkWave {
            gtkwave: &layout.gtkwave,
            target: &view_target,
            script: Some(&script),
            work_dir: &paths.temp,
        }
        .command();

        self.launch(simulator, viewer, trace, paths.progress()).await
    }

    /// Copies the runtime inputs of a project simulation into the temp directory.
    ///
    /// Failures are reported as warnings.
    fn stage_project_files(&self, project: &ProjectConfig, paths: &ProjectPaths) {
        let fs = &*self.pipeline.fs;
        let layout = &self.pipeline.settings.layout;
        let copy = |from: PathBuf, to: PathBuf| {
            if let Err(e) = fs.copy(&from, &to) {
                self.say(
                    Channel::Waveform,
                    &format!("Warning: Could not copy {}: {e}", from.display()),
                    Severity::Warning,
                );
            }
        };

        let top_level = paths.top_level_dir();
        match fs.read_dir(&top_level) {
            Ok(entries) => {
                for entry in entries {
                    let is_verilog = entry
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case("v") || e.eq_ignore_ascii_case("vh"));
                    if is_verilog {
                        continue;
                    }
                    if let Some(name) = entry.file_name() {
                        let to = paths.temp.join(name);
                        copy(entry, to);
                    }
                }
            }
            Err(e) => self.say(
                Channel::Waveform,
                &format!("Warning: Could not read TopLevel directory: {e}"),
                Severity::Warning,
            ),
        }

        for processor_type in project.processors.iter().map(|p| &p.processor_type).unique() {
            let hardware = self.root.join(processor_type).join("Hardware");
            for suffix in ["inst", "data"] {
                let name = format!("{processor_type}_{suffix}.mif");
                copy(hardware.join(&name), paths.temp.join(&name));
            }
            let name = format!("pc_{processor_type}_mem.txt");
            let pc_mem = paths.temp.join(processor_type).join(&name);
            if fs.exists(&pc_mem) {
                copy(pc_mem, paths.temp.join(&name));
            }
        }

        copy(layout.script(FIX_VCD), paths.temp.join(FIX_VCD));
    }

    /// Launches the simulator and viewer while a progress monitor watches `progress`.
    async fn launch(
        &mut self,
        simulator: Command,
        viewer: Command,
        trace: PathBuf,
        progress: PathBuf,
    ) -> Result<()> {
        let pipeline = self.pipeline;
        let settings = &pipeline.settings;

        let monitor = ProgressMonitor::new(progress)
            .with_options(settings.progress.monitor.clone())
            .with_fs(pipeline.fs.clone())
            .start();
        let mut snapshots = monitor.subscribe();
        let reporter = pipeline.reporter.clone();
        let progress_task = tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                let snapshot = *snapshots.borrow_and_update();
                reporter.progress(&snapshot);
            }
        });

        let (events, mut received) = mpsc::unbounded_channel();

        let launcher = ParallelSimulationLauncher::new(pipeline.executor.clone(), pipeline.fs.clone());
        let launch = SimulationLaunch {
            simulator,
            viewer,
            trace,
            mode: settings.simulation.launch_mode,
            poll_interval: settings.simulation.trace_poll,
            trace_timeout: settings.simulation.trace_timeout,
        };
        let result = {
            let launching = launcher.launch(launch, &events, self.cancel);
            tokio::pin!(launching);
            loop {
                tokio::select! {
                    result = &mut launching => break result,
                    Some(event) = received.recv() => {
                        forward_launch_event(&*pipeline.reporter, event);
                    }
                }
            }
        };
        drop(events);
        // Simulator events are all queued by the time the launch returns.
        while let Ok(event) = received.try_recv() {
            forward_launch_event(&*pipeline.reporter, event);
        }
        let reporter = pipeline.reporter.clone();
        tokio::spawn(async move {
            while let Some(event) = received.recv().await {
                forward_launch_event(&*reporter, event);
            }
        });

        let outcome = match &result {
            Ok(_) => monitor.settle(settings.progress.settle).await,
            Err(_) => monitor.stop().await,
        };
        if let Err(e) = progress_task.await {
            tracing::warn!(error = %e, "progress forwarding task failed");
        }
        self.report.progress = Some(outcome);

        let launched = result.map_err(|e| Error::from_icarus(Stage::Simulate, e))?;
        self.report.simulator_pid = Some(launched.simulator_pid);
        self.report.viewer_pid = Some(launched.viewer_pid);
        Ok(())
    }

    fn inject(&self, testbench: &Path, tb_module: &str, progress_dir: &Path, delay: f64) -> Result<()> {
        let injector = TestbenchInjector::new(self.pipeline.fs.clone());
        let control = SimControl {
            tb_module,
            progress_dir,
            delay,
        };
        let injection = injector
            .inject(testbench, &control)
            .map_err(|e| Error::from_icarus(Stage::Simulate, e))?;
        tracing::debug!(testbench = ?testbench, ?injection, "prepared testbench");
        Ok(())
    }

    /// Creates a processor temp directory and copies the trace helper into it.
    fn prepare_temp(&self, dir: &Path) -> Result<()> {
        let fs = &*self.pipeline.fs;
        fs.create_dir_all(dir).map_err(Error::io(dir))?;
        let helper = self.pipeline.settings.layout.script(FIX_VCD);
        if !fs.exists(&helper) {
            tracing::debug!(path = ?helper, "no trace helper to copy");
            return Ok(());
        }
        if let Err(e) = fs.copy(&helper, &dir.join(FIX_VCD)) {
            tracing::warn!(path = ?helper, error = %e, "failed to copy trace helper");
        }
        Ok(())
    }

    /// Runs one tool to completion, classifying and forwarding its output.
    async fn exec(&mut self, stage: Stage, tool: &'static str, command: Command) -> Result<()> {
        let pipeline = self.pipeline;
        let reporter = &*pipeline.reporter;
        let channel = stage.channel();
        reporter.log_output(
            channel,
            &format!("Executing: {}", display_command(&command)),
            Severity::Plain,
        );

        let mut counts = self.report.counts(stage);
        let completion = exec::run(&*pipeline.executor, command, self.cancel, |line| {
            let severity = counts.observe(&line.text);
            reporter.log_output(channel, &line.text, severity);
        })
        .await;
        self.report.set_counts(stage, counts);
        match completion? {
            Completion::Exited(0) => Ok(()),
            Completion::Exited(code) => {
                Err(Error::stage(stage, format!("{tool} exited with code {code}")))
            }
            Completion::Canceled => Err(Error::Canceled),
        }
    }

    fn check_cancel(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Canceled)
        } else {
            Ok(())
        }
    }

    fn begin(&mut self, stage: Stage) -> Result<()> {
        self.check_cancel()?;
        self.current = Some(stage);
        self.pipeline.reporter.stage_start(stage);
        Ok(())
    }

    fn finish(&mut self, stage: Stage, unit: Option<&str>, result: Result<()>) -> Result<()> {
        let status = match &result {
            Ok(()) => {
                self.pipeline.reporter.stage_success(stage);
                StageStatus::Succeeded
            }
            Err(e) if e.is_canceled() || self.cancel.is_cancelled() => StageStatus::Canceled,
            Err(e) => {
                self.pipeline.reporter.stage_error(stage, &describe(e));
                self.reported = true;
                StageStatus::Failed
            }
        };
        self.report.set(stage, status);
        self.report.record(stage, unit, status);
        result
    }

    fn say(&self, channel: Channel, text: &str, severity: Severity) {
        self.pipeline.reporter.log_output(channel, text, severity);
    }
}

fn forward_launch_event(reporter: &dyn Reporter, event: LaunchEvent) {
    let tool = match event.source {
        Source::Simulator => "vvp",
        Source::Viewer => "gtkwave",
    };
    let channel = Channel::Waveform;
    match event.kind {
        LaunchEventKind::Started { pid } => {
            reporter.log_output(channel, &format!("{tool} started (pid {pid})"), Severity::Info)
        }
        LaunchEventKind::Output(line) => {
            reporter.log_output(channel, &line.text, classify_line(&line.text))
        }
        LaunchEventKind::Completed { code } => {
            let severity = match (event.source, code) {
                (_, 0) => Severity::Success,
                (Source::Simulator, _) => Severity::Error,
                (Source::Viewer, _) => Severity::Warning,
            };
            reporter.log_output(channel, &format!("{tool} exited with code {code}"), severity)
        }
        LaunchEventKind::Error(message) => {
            reporter.log_output(channel, &format!("{tool}: {message}"), Severity::Error)
        }
    }
}

/// Formats an error and its chain of sources on one line.
pub(crate) fn describe(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(e) = source {
        message.push_str(": ");
        message.push_str(&e.to_string());
        source = e.source();
    }
    message
}

fn display_command(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|arg| {
            let arg = arg.to_string_lossy();
            if arg.contains(' ') {
                format!("\"{arg}\"")
            } else {
                arg.into_owned()
            }
        })
        .join(" ")
}
