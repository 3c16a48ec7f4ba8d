//! Error type shared by the configuration loader and the plot manager.

use std::path::PathBuf;
use pyo3::PyErr;
use thiserror::Error;

/// Possible errors of plot-manager functions.
#[derive(Debug, Error)]
pub enum Error {
    /// The Python library "matplotlib" was not found.
    #[error("The matplotlib library has not been found.\n\
             Please install it.  See https://matplotlib.org/\n\
             If you use Anaconda, see https://github.com/PyO3/pyo3/issues/1554")]
    NoMatplotlib,
    /// The path contains an element that is not a directory or does
    /// not exist.
    #[error("A path contains an element that is not a directory or does \
             not exist")]
    FileNotFoundError,
    /// Permission denied to access or create the filesystem path.
    #[error("Permission denied to access or create the filesystem path")]
    PermissionError,
    /// The active Matplotlib backend is not one we drive.
    #[error("Unsupported backend: {backend}. Please use one of: {supported:?}")]
    UnsupportedBackend {
        backend: String,
        supported: &'static [&'static str],
    },
    /// A grid needs at least one row and one column.
    #[error("Cannot create a {rows}x{cols} subplot grid")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("Invalid subplot indices: ({row}, {col})")]
    InvalidSubplot { row: usize, col: usize },
    /// Lines are numbered from 1.
    #[error("Line number {requested} out of range: the active subplot \
             holds {available} line(s)")]
    LineOutOfRange { requested: usize, available: usize },
    #[error("x and y must have the same length, got {x} and {y}")]
    LengthMismatch { x: usize, y: usize },
    #[error("Cannot save: figure window has been closed")]
    WindowClosed,
    #[error("File type {extension:?} is not one of {allowed:?}")]
    UnsupportedFileType { extension: String, allowed: Vec<String> },
    /// A configuration file could not be read.
    #[error("Cannot read configuration file {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Malformed INI text.
    #[error("{source_name}:{line}: {message}")]
    ConfigSyntax {
        source_name: String,
        line: usize,
        message: String,
    },
    #[error("No section: {0:?}")]
    MissingSection(String),
    #[error("No option {option:?} in section {section:?}")]
    MissingOption { section: String, option: String },
    #[error("Invalid value {value:?} for option {option:?} in section \
             {section:?}: expected {expected}")]
    InvalidValue {
        section: String,
        option: String,
        value: String,
        expected: &'static str,
    },
    /// Other Python errors.
    #[error("Python error: {0}")]
    Python(#[from] PyErr),
}

impl Error {
    pub(crate) fn syntax(
        source_name: &str, line: usize, message: impl Into<String>) -> Self {
        Self::ConfigSyntax {
            source_name: source_name.to_string(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_value(
        section: &str, option: &str, value: &str,
        expected: &'static str) -> Self {
        Self::InvalidValue {
            section: section.to_string(),
            option: option.to_string(),
            value: value.to_string(),
            expected,
        }
    }
}
