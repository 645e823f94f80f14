//! Database directory layout.
//!
//! ```text
//! <db_path>/
//! ├─ users/               # one directory per collection
//! │  ├─ schema.json       # field -> kind, `{}` when unconstrained
//! │  ├─ index.json        # reserved, always `{}`
//! │  ├─ data_1.shard      # JSON array of records
//! │  └─ data_2.shard
//! └─ orders/
//!    └─ ...
//! ```
//!
//! There is no lock file: a collection directory is assumed to have a single
//! writer.

use crate::error::{CoreError, CoreResult};
use oriondb_storage::DirectoryBackend;
use std::fs;
use std::path::{Path, PathBuf};

/// Root directory of a database.
#[derive(Debug, Clone)]
pub struct DatabaseDir {
    path: PathBuf,
}

impl DatabaseDir {
    /// Opens or creates a database directory.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DirectoryUnavailable`] if the directory is missing
    /// and `create_if_missing` is false, if it cannot be created, or if the
    /// path names something other than a directory.
    pub fn open(path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        let root = DirectoryBackend::open(path, create_if_missing)?;
        Ok(Self {
            path: root.path().to_path_buf(),
        })
    }

    /// Returns the database root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the directory of a collection, after validating its name.
    pub fn collection_path(&self, name: &str) -> CoreResult<PathBuf> {
        validate_collection_name(name)?;
        Ok(self.path.join(name))
    }

    /// Lists collection directories, sorted by name.
    pub fn collections(&self) -> CoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if validate_collection_name(name).is_ok() {
                    names.push(name.to_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Checks that a collection name maps to exactly one directory entry.
pub fn validate_collection_name(name: &str) -> CoreResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(CoreError::InvalidName {
            name: name.to_owned(),
        });
    }
    Ok(())
}
