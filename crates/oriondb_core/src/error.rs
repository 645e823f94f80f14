//! Error types for OrionDB core.

use oriondb_codec::CodecError;
use oriondb_storage::StorageError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in OrionDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[source] StorageError),

    /// JSON codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A database or collection directory cannot be created or accessed.
    #[error("directory unavailable: {}: {source}", path.display())]
    DirectoryUnavailable {
        /// The directory that could not be used.
        path: PathBuf,
        /// The underlying I/O failure.
        source: io::Error,
    },

    /// A shard file is not a well-formed record sequence.
    #[error("corrupt shard {shard}: {message}")]
    CorruptShard {
        /// Name of the shard file.
        shard: String,
        /// Description of the corruption.
        message: String,
    },

    /// A collection metadata file (such as `schema.json`) is malformed.
    #[error("corrupt metadata {name}: {message}")]
    CorruptMetadata {
        /// Name of the metadata file.
        name: String,
        /// Description of the problem.
        message: String,
    },

    /// A parallel-scan worker could not complete its shard.
    #[error("scan worker failed on shard {shard}: {reason}")]
    WorkerFailure {
        /// The shard the worker was assigned.
        shard: String,
        /// Why the worker failed.
        reason: String,
    },

    /// A regular expression did not compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Configuration values are out of range.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// A collection name cannot be used as a directory name.
    #[error("invalid collection name: {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DirectoryUnavailable { path, source } => {
                Self::DirectoryUnavailable { path, source }
            }
            other => Self::Storage(other),
        }
    }
}

impl CoreError {
    /// Creates a corrupt shard error.
    pub fn corrupt_shard(shard: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptShard {
            shard: shard.into(),
            message: message.into(),
        }
    }

    /// Creates a corrupt metadata error.
    pub fn corrupt_metadata(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptMetadata {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a worker failure error.
    pub fn worker_failure(shard: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WorkerFailure {
            shard: shard.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true for [`CoreError::CorruptShard`].
    #[must_use]
    pub fn is_corrupt_shard(&self) -> bool {
        matches!(self, Self::CorruptShard { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_errors_are_lifted() {
        let storage = StorageError::directory_unavailable(
            "/nowhere",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let core: CoreError = storage.into();
        assert!(matches!(core, CoreError::DirectoryUnavailable { .. }));
    }

    #[test]
    fn other_storage_errors_are_wrapped() {
        let core: CoreError = StorageError::not_found("data_1.shard").into();
        assert!(matches!(core, CoreError::Storage(StorageError::NotFound { .. })));
    }

    #[test]
    fn messages_name_the_shard() {
        let err = CoreError::worker_failure("data_3.shard", "corrupt");
        assert_eq!(
            err.to_string(),
            "scan worker failed on shard data_3.shard: corrupt"
        );
        assert!(CoreError::corrupt_shard("data_1.shard", "eof").is_corrupt_shard());
    }
}
