//! Error types for distribution access
//!
//! Absence is not an error here: a missing metadata file, an unknown
//! relative path or an unknown namespace all come back as `None` or an
//! empty collection. Only construction, extraction, filesystem and parse
//! failures surface as [`DistError`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while accessing a distribution
#[derive(Error, Debug)]
pub enum DistError {
    /// Neither an archive nor a directory was supplied, or options were invalid
    #[error("Invalid distribution configuration: {0}")]
    Configuration(String),

    /// The archive could not be unpacked into the working directory
    #[error("Failed to extract archive {archive}")]
    Extraction {
        archive: PathBuf,
        #[source]
        source: ExtractError,
    },

    /// A timestamp was requested for a path that does not exist
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Walking the working directory failed
    #[error("Failed to walk distribution directory")]
    Walk(#[from] walkdir::Error),

    /// Reading a file inside the distribution failed
    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A metadata file exists but could not be parsed
    #[error("Failed to parse metadata file {path}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },
}

/// Reasons an extraction can fail
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unrecognized archive format")]
    UnsupportedFormat,

    #[error("Cannot open archive")]
    Open(#[source] std::io::Error),

    #[error("Failed to allocate a temporary directory")]
    TempDir(#[source] std::io::Error),

    #[error("Corrupt or unreadable tar stream")]
    Tar(#[source] std::io::Error),

    #[error("Corrupt or unreadable zip archive")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to walk unpacked archive")]
    Walk(#[from] walkdir::Error),

    /// An unpacked entry could not be moved or created under the working directory
    #[error("Failed to re-home {path}")]
    Rehome {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reasons a metadata file fails to parse
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot read metadata file")]
    Read(#[from] std::io::Error),

    #[error("Unknown metadata format for {0}")]
    UnknownFormat(PathBuf),
}

pub type Result<T> = std::result::Result<T, DistError>;
