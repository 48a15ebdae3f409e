//! Yosys errors.

use std::path::PathBuf;

use thiserror::Error as ThisError;

/// The result type returned by Yosys library functions.
pub type Result<T> = std::result::Result<T, Error>;

/// Possible Yosys errors.
#[derive(ThisError, Debug)]
pub enum Error {
    /// I/O error on a specific file.
    #[error("io error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Template parsing/rendering error.
    #[error("template error")]
    Template(#[from] tera::Error),
    /// Error starting or supervising a tool.
    #[error("error running tool")]
    Exec(#[from] exec::error::Error),
    /// A tool exited with a non-zero code.
    #[error("{tool} exited with code {code}")]
    ToolFailed { tool: &'static str, code: i32 },
    /// A tool exited cleanly without writing its output.
    #[error("{tool} did not write {path:?}")]
    MissingOutput { tool: &'static str, path: PathBuf },
    /// The written netlist could not be parsed.
    #[error("error parsing netlist")]
    Netlist(#[from] hierarchy::error::Error),
    /// The run was canceled.
    #[error("canceled")]
    Canceled,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
