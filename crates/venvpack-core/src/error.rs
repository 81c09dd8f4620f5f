//! Error types for venvpack-core

use std::path::PathBuf;

/// Result type for venvpack-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while bundling, unpacking, or repairing an
/// environment. Every variant carries the offending path so callers can
/// diagnose failures without re-running the operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Destination already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("Malformed archive entry {entry:?}: {message}")]
    MalformedArchive { entry: String, message: String },

    #[error("Permission denied at {path}: {source}")]
    Permission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an `io::Error` with the path it occurred at.
    ///
    /// OS-level permission denials are surfaced as their own variant,
    /// everything else is generic I/O.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::Permission {
                path: path.into(),
                source,
            }
        } else {
            Self::Io {
                path: path.into(),
                source,
            }
        }
    }

    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn already_exists(path: impl Into<PathBuf>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    pub fn malformed(entry: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedArchive {
            entry: entry.into(),
            message: message.into(),
        }
    }
}
