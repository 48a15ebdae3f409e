//! Icarus errors.

use std::path::PathBuf;

use thiserror::Error as ThisError;

/// The result type returned by Icarus library functions.
pub type Result<T> = std::result::Result<T, Error>;

/// Possible Icarus errors.
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
    /// Error starting or supervising a process.
    #[error("error running process")]
    Exec(#[from] exec::error::Error),
    /// The testbench has no `endmodule` to insert the control block before.
    #[error("no endmodule found in testbench {0:?}")]
    MissingEndmodule(PathBuf),
    /// Simulation delays must be finite and non-negative.
    #[error("invalid simulation delay {0}")]
    InvalidDelay(f64),
    /// The simulator exited with a non-zero code.
    #[error("simulator exited with code {code}")]
    SimulatorFailed { code: i32 },
    /// The simulator finished without writing a trace file.
    #[error("simulator did not write trace file {0:?}")]
    TraceMissing(PathBuf),
    /// The trace file did not appear in time.
    #[error("timed out waiting for trace file {0:?}")]
    TraceTimeout(PathBuf),
    /// The launch was canceled.
    #[error("canceled")]
    Canceled,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
