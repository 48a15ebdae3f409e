use std::fs;
use std::path::{Path, PathBuf};

use exec::{Executor, OutputLine};
use hierarchy::Design;
use serde::Serialize;
use tera::Context;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::{run_script, TEMPLATES};

#[derive(Serialize)]
pub struct HierarchyParams<'a> {
    /// The Yosys executable.
    pub yosys: &'a Path,
    pub work_dir: &'a Path,
    /// Every Verilog file of the design.
    pub files: &'a [PathBuf],
    pub top: &'a str,
    pub json_path: &'a Path,
}

#[derive(Serialize)]
struct HierarchyScriptContext<'a> {
    files: &'a [PathBuf],
    top: &'a str,
    json_path: &'a Path,
}

pub(crate) fn write_hierarchy_script(params: &HierarchyParams) -> Result<PathBuf> {
    fs::create_dir_all(params.work_dir).map_err(Error::io(params.work_dir))?;
    let script_path = params.work_dir.join("hierarchy.ys");

    let context = Context::from_serialize(HierarchyScriptContext {
        files: params.files,
        top: params.top,
        json_path: params.json_path,
    })?;
    let contents = TEMPLATES.render("hierarchy.ys", &context)?;
    fs::write(&script_path, contents).map_err(Error::io(&script_path))?;

    Ok(script_path)
}

/// Elaborates the design with Yosys and parses the resulting netlist.
///
/// Fails if Yosys exits with a non-zero code or does not write the JSON netlist.
pub async fn run_hierarchy(
    params: &HierarchyParams<'_>,
    executor: &dyn Executor,
    cancel: &CancellationToken,
    sink: impl FnMut(&OutputLine),
) -> Result<Design> {
    let _ = fs::remove_file(params.json_path);
    let script_path = write_hierarchy_script(params)?;
    tracing::debug!(top = params.top, files = params.files.len(), "running yosys hierarchy");
    run_script(
        params.yosys,
        &script_path,
        params.work_dir,
        executor,
        cancel,
        sink,
    )
    .await?;
    if !params.json_path.exists() {
        return Err(Error::MissingOutput {
            tool: "yosys",
            path: params.json_path.to_path_buf(),
        });
    }
    let json = fs::read_to_string(params.json_path).map_err(Error::io(params.json_path))?;
    Ok(Design::from_json(&json)?)
}
