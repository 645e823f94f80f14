//! Database facade.

use crate::collection::Collection;
use crate::config::{Config, SelectOptions};
use crate::dir::DatabaseDir;
use crate::error::CoreResult;
use oriondb_storage::DirectoryBackend;
use std::path::Path;
use std::sync::Arc;

/// The main database handle.
///
/// A database is a directory of collections. Opening one only makes sure the
/// directory exists; collections are opened, and created on first use, with
/// [`Database::select`].
///
/// # Opening a Database
///
/// ```rust,ignore
/// use oriondb_core::{Config, Database, SelectOptions};
///
/// let db = Database::open_with_config("data", Config::new().shard_size(1000))?;
///
/// let users = db.select("users")?;
/// let events = db.select_with("events", SelectOptions::new().parallel(true))?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    dir: DatabaseDir,
    config: Config,
}

impl Database {
    /// Opens a database with default configuration.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a database with custom configuration.
    ///
    /// The configuration becomes the default for every collection selected
    /// through this handle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidConfig`] for unusable settings and
    /// [`crate::CoreError::DirectoryUnavailable`] if the root directory
    /// cannot be used.
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        config.validate()?;
        let dir = DatabaseDir::open(path.as_ref(), config.create_if_missing)?;
        tracing::info!(path = %dir.path().display(), "opened database");
        Ok(Self { dir, config })
    }

    /// Returns the database root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the database-wide configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens a collection, creating its directory if needed.
    pub fn select(&self, name: &str) -> CoreResult<Collection> {
        self.select_with(name, SelectOptions::default())
    }

    /// Opens a collection with per-collection overrides.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidName`] if `name` is not a plain
    /// directory name and [`crate::CoreError::DirectoryUnavailable`] if the
    /// collection directory cannot be created.
    pub fn select_with(&self, name: &str, options: SelectOptions) -> CoreResult<Collection> {
        let path = self.dir.collection_path(name)?;
        let config = self.config.merged(&options);
        let backend = DirectoryBackend::open(&path, true)?.sync_writes(config.sync_writes);
        Collection::open(name, Arc::new(backend), config)
    }

    /// Lists existing collections by name.
    pub fn collections(&self) -> CoreResult<Vec<String>> {
        self.dir.collections()
    }
}
