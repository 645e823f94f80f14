//! Storage backend trait definition.

use crate::error::{StorageError, StorageResult};
use std::fmt;

/// A low-level storage backend for OrionDB.
///
/// Storage backends are **opaque named-blob stores**. A collection keeps its
/// schema, placeholder index and shard files as blobs; backends know nothing
/// about JSON, shards or records - OrionDB owns all format interpretation.
///
/// # Invariants
///
/// - `read` returns exactly the bytes of the last successful `write`
/// - `write` replaces a blob atomically: readers observe either the old or the
///   new content, never a mix
/// - `list` never reports temporary files left by an interrupted `write`
/// - Backends must be `Send + Sync`; parallel scans read through a shared handle
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::DirectoryBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync + fmt::Debug {
    /// Lists the names of all stored blobs, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be produced.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Reads the full content of a blob.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if no blob has this name, or an I/O
    /// error if reading fails.
    fn read(&self, name: &str) -> StorageResult<Vec<u8>>;

    /// Replaces the content of a blob, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the write fails.
    fn write(&self, name: &str, data: &[u8]) -> StorageResult<()>;

    /// Returns true if a blob with this name exists.
    ///
    /// # Errors
    ///
    /// Returns an error if existence cannot be determined.
    fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Human readable location of the store, used in diagnostics.
    fn location(&self) -> String;
}

/// Rejects names that could escape the store or collide with temp files.
pub(crate) fn validate_name(name: &str) -> StorageResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.ends_with(crate::TEMP_SUFFIX);
    if invalid {
        return Err(StorageError::InvalidName {
            name: name.to_owned(),
        });
    }
    Ok(())
}
