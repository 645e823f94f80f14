//! Directory-based storage backend for persistent storage.

use crate::backend::{validate_name, StorageBackend};
use crate::error::{StorageError, StorageResult};
use crate::TEMP_SUFFIX;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A storage backend that keeps each blob as a file in one directory.
///
/// Data survives process restarts. Writes go to `<name>.tmp` first and are
/// then renamed over the target, so a reader never sees a half-written file.
///
/// # Durability
///
/// By default the temp file is flushed to the OS but not fsynced. Enable
/// [`DirectoryBackend::sync_writes`] to `sync_all` the file and the directory
/// on every write.
///
/// # Example
///
/// ```no_run
/// use oriondb_storage::{DirectoryBackend, StorageBackend};
/// use std::path::Path;
///
/// let backend = DirectoryBackend::open(Path::new("mydb/users"), true).unwrap();
/// backend.write("data_1.shard", b"[]").unwrap();
/// assert_eq!(backend.read("data_1.shard").unwrap(), b"[]");
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryBackend {
    path: PathBuf,
    sync: bool,
}

impl DirectoryBackend {
    /// Opens a directory backend, creating the directory if allowed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::DirectoryUnavailable`] if the directory is
    /// missing and `create_if_missing` is false, if it cannot be created, or
    /// if the path exists but is not a directory.
    pub fn open(path: &Path, create_if_missing: bool) -> StorageResult<Self> {
        if !path.exists() {
            if !create_if_missing {
                return Err(StorageError::directory_unavailable(
                    path,
                    io::Error::new(io::ErrorKind::NotFound, "directory does not exist"),
                ));
            }
            fs::create_dir_all(path)
                .map_err(|e| StorageError::directory_unavailable(path, e))?;
            tracing::debug!(path = %path.display(), "created directory");
        }

        if !path.is_dir() {
            return Err(StorageError::directory_unavailable(
                path,
                io::Error::other("path is not a directory"),
            ));
        }

        Ok(Self {
            path: path.to_path_buf(),
            sync: false,
        })
    }

    /// Sets whether every write is fsynced before it is reported done.
    #[must_use]
    pub fn sync_writes(mut self, value: bool) -> Self {
        self.sync = value;
        self
    }

    /// Returns the path to the backing directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn blob_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> io::Result<()> {
        File::open(&self.path)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> io::Result<()> {
        // NTFS journals metadata; there is no directory handle to fsync.
        Ok(())
    }
}

impl StorageBackend for DirectoryBackend {
    fn list(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if name.ends_with(TEMP_SUFFIX) {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        validate_name(name)?;
        fs::read(self.blob_path(name)).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StorageError::not_found(name)
            } else {
                StorageError::Io(e)
            }
        })
    }

    fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        validate_name(name)?;
        let target = self.blob_path(name);
        let temp = self.blob_path(&format!("{name}{TEMP_SUFFIX}"));

        let written = File::create(&temp)
            .and_then(|mut file| {
                file.write_all(data)?;
                file.flush()?;
                if self.sync {
                    file.sync_all()?;
                }
                Ok(())
            })
            .and_then(|()| fs::rename(&temp, &target));
        discard_on_error(&temp, written)?;

        if self.sync {
            self.sync_directory()?;
        }
        Ok(())
    }

    fn exists(&self, name: &str) -> StorageResult<bool> {
        validate_name(name)?;
        Ok(self.blob_path(name).is_file())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Removes the temp file if any step of a write failed.
fn discard_on_error<T>(temp: &Path, result: io::Result<T>) -> io::Result<T> {
    if result.is_err() {
        // Best effort: the temp file is invisible to `list` either way.
        let _ = fs::remove_file(temp);
    }
    result
}
