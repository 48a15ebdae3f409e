//! Yosys plugin for building design hierarchies and schematics.

use std::path::Path;
use std::process::Command;

use exec::{Completion, Executor, OutputLine};
use lazy_static::lazy_static;
use tera::Tera;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

pub mod error;
pub mod hierarchy;
pub mod schematic;

pub use crate::hierarchy::{run_hierarchy, HierarchyParams};
pub use crate::schematic::{run_schematic, SchematicParams};

pub const TEMPLATES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        match Tera::new(&format!("{TEMPLATES_PATH}/*")) {
            Ok(t) => t,
            Err(e) => {
                panic!("Encountered errors while parsing Tera templates: {e}");
            }
        }
    };
}

/// Runs a Yosys script in `work_dir`, failing on a non-zero exit.
pub(crate) async fn run_script(
    yosys: &Path,
    script_path: &Path,
    work_dir: &Path,
    executor: &dyn Executor,
    cancel: &CancellationToken,
    sink: impl FnMut(&OutputLine),
) -> Result<()> {
    let mut command = Command::new(yosys);
    command.arg("-s").arg(script_path).current_dir(work_dir);
    check(exec::run(executor, command, cancel, sink).await?, "yosys")
}

pub(crate) fn check(completion: Completion, tool: &'static str) -> Result<()> {
    match completion {
        Completion::Exited(0) => Ok(()),
        Completion::Exited(code) => Err(Error::ToolFailed { tool, code }),
        Completion::Canceled => Err(Error::Canceled),
    }
}
