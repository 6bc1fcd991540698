//! Error types for build list resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while populating a build catalog.
///
/// Per-artifact inspection problems and malformed XML never show up here;
/// they are logged and degrade the affected builds instead.
#[derive(Debug, Error)]
pub enum BuildListError {
    /// Build list format could not be determined or is not supported
    #[error("Unsupported build list format for {path}: {reason}")]
    UnsupportedFormat {
        /// Path to the build list file
        path: PathBuf,
        /// What was rejected (extension or explicit format name)
        reason: String,
    },

    /// Failed to read the build list file
    #[error("Failed to load builds from {path}: {source}")]
    LoadFailed {
        /// Path to the build list file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to list a device directory that exists
    #[error("Failed to read build directory {path}: {source}")]
    ReadDirFailed {
        /// Device directory path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid JSON in the build list file
    #[error("Invalid JSON in build list: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Invalid YAML in the build list file
    #[error("Invalid YAML in build list: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// CSV reader failure (I/O or encoding, not column count)
    #[error("Invalid CSV in build list: {0}")]
    InvalidCsv(#[from] csv::Error),
}

/// Failure to read metadata out of a single build artifact.
#[derive(Debug, Error)]
pub(crate) enum InspectError {
    /// Archive could not be opened or the entry is missing
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Scratch file or artifact I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The property file has no SDK version line
    #[error("no ro.build.version.sdk in {0}")]
    MissingProperty(&'static str),
}
