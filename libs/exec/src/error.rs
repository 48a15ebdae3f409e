//! Process execution errors.

use std::path::PathBuf;

use thiserror::Error as ThisError;

/// The result type returned by process execution functions.
pub type Result<T> = std::result::Result<T, Error>;

/// Possible process execution errors.
#[derive(ThisError, Debug)]
pub enum Error {
    /// The executable could not be started.
    #[error("failed to spawn {program:?}")]
    Spawn {
        /// The program that was being started.
        program: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The operating system did not report a process identifier.
    #[error("spawned process {0:?} has no process id")]
    MissingPid(PathBuf),
    /// The event stream of a process closed before it reported an exit.
    #[error("lost track of process {0} before it exited")]
    Disconnected(u32),
    /// Terminating a process failed.
    #[error("failed to terminate process {pid}")]
    Kill {
        /// The identifier of the process being terminated.
        pid: u32,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
