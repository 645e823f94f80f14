//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backing directory cannot be created or accessed.
    #[error("directory unavailable: {}: {source}", path.display())]
    DirectoryUnavailable {
        /// The directory that could not be used.
        path: PathBuf,
        /// The underlying I/O failure.
        source: io::Error,
    },

    /// No blob exists under the requested name.
    #[error("blob not found: {name}")]
    NotFound {
        /// The requested name.
        name: String,
    },

    /// The name cannot be used as a blob name.
    #[error("invalid blob name: {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },
}

impl StorageError {
    /// Creates a directory unavailable error.
    pub fn directory_unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::DirectoryUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Creates a not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}
