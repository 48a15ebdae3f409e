//! Severity classification for toolchain output.

#![warn(missing_docs)]


use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// An enumeration of possible severity levels of a line of tool output.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Severity {
    /// Output that matched no marker.
    #[default]
    Plain,
    /// An informational message or tip.
    Info,
    /// A success message.
    Success,
    /// A warning.
    Warning,
    /// An error. Never fatal by itself: the exit code decides.
    Error,
}

/// Ordered marker table. The first entry with a matching marker wins.
///
/// The toolchain emits a mix of Portuguese and English messages, so
/// both spellings of each marker are listed.
const MARKERS: &[(&[&str], Severity)] = &[
    (&["Atenção", "Warning"], Severity::Warning),
    (&["Erro", "ERROR"], Severity::Error),
    (&["Sucesso", "Success"], Severity::Success),
    (&["Info", "Tip"], Severity::Info),
    (&["não está sendo usada", "Economize memória"], Severity::Info),
    (&["de sintaxe", "cadê a função"], Severity::Error),
];

/// Classifies one line of tool output by scanning for fixed keyword markers.
pub fn classify_line(line: &str) -> Severity {
    MARKERS
        .iter()
        .find(|(markers, _)| markers.iter().any(|m| line.contains(m)))
        .map(|(_, severity)| *severity)
        .unwrap_or_default()
}

/// Per-severity line counts for a block of tool output.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct SeverityCounts {
    num_errors: usize,
    num_warnings: usize,
    num_lines: usize,
}

impl SeverityCounts {
    /// Creates a new, empty set of counters.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies `line`, records it, and returns its severity.
    pub fn observe(&mut self, line: &str) -> Severity {
        let severity = classify_line(line);
        self.add(severity);
        severity
    }

    /// Records a line of the given severity.
    #[inline]
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.num_errors += 1,
            Severity::Warning => self.num_warnings += 1,
            _ => (),
        };
        self.num_lines += 1;
    }

    /// Returns `true` if an error line was seen.
    pub fn has_error(&self) -> bool {
        self.num_errors > 0
    }

    /// The number of error lines seen.
    #[inline]
    pub fn num_errors(&self) -> usize {
        self.num_errors
    }

    /// Returns `true` if a warning line was seen.
    pub fn has_warning(&self) -> bool {
        self.num_warnings > 0
    }

    /// The number of warning lines seen.
    #[inline]
    pub fn num_warnings(&self) -> usize {
        self.num_warnings
    }

    /// The total number of lines seen.
    #[inline]
    pub fn num_lines(&self) -> usize {
        self.num_lines
    }
}

impl Severity {
    /// Returns log level corresponding to this severity.
    #[inline]
    pub const fn as_tracing_level(&self) -> tracing::Level {
        match *self {
            Self::Plain => tracing::Level::DEBUG,
            Self::Info | Self::Success => tracing::Level::INFO,
            Self::Warning => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }

    /// Returns `true` if the severity is [`Severity::Error`].
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(*self, Self::Error)
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Plain => write!(f, "plain"),
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl Display for SeverityCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} lines, {} errors, {} warnings",
            self.num_lines, self.num_errors, self.num_warnings
        )
    }
}
