//! Pipeline errors.

use std::path::PathBuf;

use thiserror::Error as ThisError;

use crate::report::Stage;

/// The result type returned by pipeline functions.
pub type Result<T> = std::result::Result<T, Error>;

/// Problems with project or toolchain configuration.
///
/// These are detected before any stage runs.
#[derive(ThisError, Debug)]
pub enum ConfigError {
    /// Processor mode needs exactly one active processor.
    #[error("no active processor found")]
    NoActiveProcessor,
    /// The processor has no source file selected.
    #[error("no source file selected for processor `{0}`")]
    NoSourceFile(String),
    /// A project references a processor type with no configuration record.
    #[error("processor type `{0}` is not configured")]
    UnknownProcessor(String),
    /// No file is starred in the given role.
    #[error("no {0} file selected")]
    NoStarredFile(&'static str),
    /// More than one file is starred in the given role.
    #[error("more than one {0} file is starred")]
    AmbiguousStar(&'static str),
    /// A required configuration file does not exist.
    #[error("configuration file {0:?} not found")]
    Missing(PathBuf),
    /// A configuration file could not be read.
    #[error("failed to read configuration file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A JSON configuration file is malformed.
    #[error("malformed configuration file {path:?}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The toolchain settings file is malformed.
    #[error("malformed settings file {path:?}")]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Possible pipeline errors.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid or missing configuration.
    #[error("configuration error")]
    Config(#[from] ConfigError),
    /// A toolchain step failed.
    #[error("{stage} failed: {message}")]
    Stage {
        stage: Stage,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    /// The run was canceled by the user.
    #[error("compilation canceled")]
    Canceled,
    /// I/O error on a specific file.
    #[error("io error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Error starting or supervising a process.
    #[error("error running process")]
    Exec(#[from] exec::error::Error),
    /// Synthesis or netlist parsing failed during hierarchy analysis.
    #[error("hierarchy analysis failed")]
    Hierarchy(#[source] yosys::error::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    pub(crate) fn stage(stage: Stage, message: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            message: message.into(),
            source: None,
        }
    }

    /// Maps an error raised by the Icarus plugin during `stage`.
    pub(crate) fn from_icarus(stage: Stage, error: icarus::error::Error) -> Self {
        use icarus::error::Error as IcarusError;
        match error {
            IcarusError::Canceled => Self::Canceled,
            IcarusError::Io { path, source } => Self::Io { path, source },
            IcarusError::Exec(e) => Self::Exec(e),
            IcarusError::SimulatorFailed { code } => {
                Self::stage(stage, format!("simulator exited with code {code}"))
            }
            other => Self::Stage {
                stage,
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }

    /// Returns `true` if this error is [`Error::Canceled`].
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

impl From<yosys::error::Error> for Error {
    fn from(error: yosys::error::Error) -> Self {
        match error {
            yosys::error::Error::Canceled => Self::Canceled,
            other => Self::Hierarchy(other),
        }
    }
}

/// A failed pipeline run.
///
/// Carries the report of everything that ran before the failure.
#[derive(ThisError, Debug)]
#[error("pipeline run failed")]
pub struct Failure {
    pub report: crate::report::RunReport,
    #[source]
    pub error: Error,
}

impl Failure {
    /// Returns `true` if the run was canceled.
    pub fn is_canceled(&self) -> bool {
        self.error.is_canceled()
    }
}
