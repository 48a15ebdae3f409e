use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use anyhow::Context;
use aurora::{Channel, HierarchyRequest, Pipeline, Reporter, RunMode, Settings, Stage};
use clap::{Parser as ClapParser, Subcommand};
use diagnostics::Severity;
use exec::fs::LocalFs;
use progress::{Phase, Snapshot};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load(&LocalFs, &args.components).with_context(|| {
        format!("Failed to load toolchain settings from {:?}.", args.components)
    })?;
    let pipeline = Pipeline::new(settings).with_reporter(Arc::new(TerminalReporter::default()));
    tracing::debug!(project = ?args.project, components = ?args.components, "loaded settings");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, canceling...");
            on_interrupt.cancel();
        }
    });

    match args.command {
        Command::Build { project_mode } => {
            let mode = if project_mode {
                RunMode::Project
            } else {
                RunMode::Processor
            };
            match pipeline.run(&args.project, mode, &cancel).await {
                Ok(report) => {
                    println!("Build complete: {}", report.compiled.join(", "));
                    let warnings: usize = Stage::ALL
                        .iter()
                        .map(|stage| report.counts(*stage).num_warnings())
                        .sum();
                    if warnings > 0 {
                        println!("{warnings} warning(s) reported by the toolchain.");
                    }
                    if let Some(pid) = report.viewer_pid {
                        println!("Waveform viewer running (pid {pid}).");
                    }
                }
                Err(failure) if failure.is_canceled() => {
                    eprintln!("Build canceled.");
                    std::process::exit(130);
                }
                Err(failure) => {
                    for stage in Stage::ALL {
                        eprintln!(
                            "  {stage}: {:?} ({})",
                            failure.report.status(stage),
                            failure.report.counts(stage)
                        );
                    }
                    return Err(failure.error).context("Build failed.");
                }
            }
        }
        Command::Hierarchy { project_mode } => {
            let request = request(&pipeline, &args.project, project_mode)?;
            let tree = request
                .analyze(&pipeline, &cancel)
                .await
                .context("Failed to analyze design hierarchy.")?;
            print!("{tree}");
        }
        Command::Schematic { project_mode, out } => {
            let request = request(&pipeline, &args.project, project_mode)?;
            let out = out.unwrap_or_else(|| request.work_dir.join(format!("{}.svg", request.top)));
            request
                .schematic(&pipeline, &out, &cancel)
                .await
                .with_context(|| format!("Failed to draw schematic to {:?}.", out))?;
            println!("{}", out.display());
        }
    }

    Ok(())
}

fn request(pipeline: &Pipeline, project: &Path, project_mode: bool) -> anyhow::Result<HierarchyRequest> {
    let mode = if project_mode {
        RunMode::Project
    } else {
        RunMode::Processor
    };
    HierarchyRequest::resolve(pipeline, &LocalFs, project, mode)
        .with_context(|| format!("Failed to read project configuration in {:?}.", project))
}

/// Arguments to the `aurora` command line.
#[derive(ClapParser)]
#[command(
    version,
    about,
    long_about = "Compile, simulate and inspect SAPHO processor projects"
)]
pub struct Args {
    /// The project root, containing `processorConfig.json`.
    #[arg(short, long, default_value = ".")]
    project: PathBuf,
    /// The toolchain components directory, containing `bin/`, `HDL/` and `Temp/`.
    #[arg(short, long, env = "AURORA_COMPONENTS")]
    components: PathBuf,
    /// Log debug output.
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile the active processor (or the whole project) and simulate it.
    Build {
        /// Build every processor of the multi-processor project.
        #[arg(long)]
        project_mode: bool,
    },
    /// Print the instance hierarchy of the design.
    Hierarchy {
        #[arg(long)]
        project_mode: bool,
    },
    /// Draw the flattened design as an SVG schematic.
    Schematic {
        #[arg(long)]
        project_mode: bool,
        /// The output file. Defaults to `<top>.svg` in the temp directory.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Prints tool output and stage transitions to the terminal.
#[derive(Default)]
struct TerminalReporter {
    /// Last printed progress decile.
    decile: AtomicU8,
}

impl Reporter for TerminalReporter {
    fn log_output(&self, channel: Channel, text: &str, severity: Severity) {
        let marker = match severity {
            Severity::Plain => " ",
            Severity::Info => "i",
            Severity::Success => "+",
            Severity::Warning => "!",
            Severity::Error => "x",
        };
        if severity.is_error() {
            eprintln!("[{channel}] {marker} {text}");
        } else {
            println!("[{channel}] {marker} {text}");
        }
    }

    fn stage_start(&self, stage: Stage) {
        println!("==> {stage}");
    }

    fn stage_success(&self, stage: Stage) {
        println!("==> {stage} succeeded");
    }

    fn stage_error(&self, stage: Stage, message: &str) {
        eprintln!("==> {stage} failed: {message}");
    }

    fn progress(&self, snapshot: &Snapshot) {
        if snapshot.phase == Phase::Sampling || snapshot.phase == Phase::Animating {
            let decile = (snapshot.current / 10.0).floor() as u8;
            if self.decile.swap(decile, Ordering::Relaxed) != decile {
                println!("[wave]   simulation {:>3}%", decile as u32 * 10);
            }
        }
    }
}
