use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use exec::{Executor, OutputLine};
use serde::Serialize;
use tera::Context;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::{check, run_script, TEMPLATES};

#[derive(Serialize)]
pub struct SchematicParams<'a> {
    pub yosys: &'a Path,
    /// The `netlistsvg` executable.
    pub netlistsvg: &'a Path,
    pub work_dir: &'a Path,
    pub files: &'a [PathBuf],
    pub top: &'a str,
    /// Flattened netlist written by Yosys.
    pub json_path: &'a Path,
    pub svg_path: &'a Path,
}

#[derive(Serialize)]
struct SchematicScriptContext<'a> {
    files: &'a [PathBuf],
    top: &'a str,
    json_path: &'a Path,
}

fn write_schematic_script(params: &SchematicParams) -> Result<PathBuf> {
    fs::create_dir_all(params.work_dir).map_err(Error::io(params.work_dir))?;
    let script_path = params.work_dir.join("schematic.ys");

    let context = Context::from_serialize(SchematicScriptContext {
        files: params.files,
        top: params.top,
        json_path: params.json_path,
    })?;
    let contents = TEMPLATES.render("schematic.ys", &context)?;
    fs::write(&script_path, contents).map_err(Error::io(&script_path))?;

    Ok(script_path)
}

/// Synthesizes and flattens the design, then draws it with `netlistsvg`.
pub async fn run_schematic(
    params: &SchematicParams<'_>,
    executor: &dyn Executor,
    cancel: &CancellationToken,
    mut sink: impl FnMut(&OutputLine),
) -> Result<()> {
    let _ = fs::remove_file(params.json_path);
    let _ = fs::remove_file(params.svg_path);
    let script_path = write_schematic_script(params)?;
    run_script(
        params.yosys,
        &script_path,
        params.work_dir,
        executor,
        cancel,
        &mut sink,
    )
    .await?;
    if !params.json_path.exists() {
        return Err(Error::MissingOutput {
            tool: "yosys",
            path: params.json_path.to_path_buf(),
        });
    }

    let mut command = Command::new(params.netlistsvg);
    command
        .arg(params.json_path)
        .arg("-o")
        .arg(params.svg_path)
        .current_dir(params.work_dir);
    check(
        exec::run(executor, command, cancel, &mut sink).await?,
        "netlistsvg",
    )?;
    if !params.svg_path.exists() {
        return Err(Error::MissingOutput {
            tool: "netlistsvg",
            path: params.svg_path.to_path_buf(),
        });
    }
    Ok(())
}
