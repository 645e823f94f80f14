//! Database and collection configuration.

use crate::error::{CoreError, CoreResult};
use std::num::NonZeroUsize;
use std::thread;

/// Default number of records a shard holds before writes roll over.
pub const DEFAULT_SHARD_SIZE: usize = 5000;

/// Default number of decoded shards kept in a collection's cache.
pub const DEFAULT_CACHE_LIMIT: usize = 10;

/// Ceiling on the hardware parallelism used to size the scan pool.
const MAX_HARDWARE_THREADS: usize = 8;

/// Extra workers on top of the hardware bound; scans are I/O heavy.
const THREAD_HEADROOM: usize = 2;

/// Returns the default parallel-scan worker bound.
///
/// This is `min(available_parallelism, 8) + 2`.
#[must_use]
pub fn default_max_threads() -> usize {
    let cpus = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    cpus.min(MAX_HARDWARE_THREADS) + THREAD_HEADROOM
}

/// Configuration for opening a database and its collections.
///
/// Every collection gets its own copy, so collections in one process can be
/// tuned independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether to create the database directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether inserts are coerced through the collection schema.
    pub strict_data: bool,

    /// Maximum number of records per shard.
    pub shard_size: usize,

    /// Maximum number of shards held in the cache (0 disables caching).
    pub cache_limit: usize,

    /// Maximum number of concurrently running parallel-scan workers.
    pub max_threads: usize,

    /// Whether `search` takes the parallel path.
    pub parallel: bool,

    /// Whether shard writes are fsynced.
    pub sync_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            strict_data: true,
            shard_size: DEFAULT_SHARD_SIZE,
            cache_limit: DEFAULT_CACHE_LIMIT,
            max_threads: default_max_threads(),
            parallel: false,
            sync_writes: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the database if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether inserts are coerced through the schema.
    #[must_use]
    pub const fn strict_data(mut self, value: bool) -> Self {
        self.strict_data = value;
        self
    }

    /// Sets the maximum number of records per shard.
    #[must_use]
    pub const fn shard_size(mut self, size: usize) -> Self {
        self.shard_size = size;
        self
    }

    /// Sets the number of cached shards.
    #[must_use]
    pub const fn cache_limit(mut self, limit: usize) -> Self {
        self.cache_limit = limit;
        self
    }

    /// Sets the parallel-scan worker bound.
    #[must_use]
    pub const fn max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }

    /// Sets whether `search` runs in parallel.
    #[must_use]
    pub const fn parallel(mut self, value: bool) -> Self {
        self.parallel = value;
        self
    }

    /// Sets whether shard writes are fsynced.
    #[must_use]
    pub const fn sync_writes(mut self, value: bool) -> Self {
        self.sync_writes = value;
        self
    }

    /// Returns a copy with the per-select overrides applied.
    #[must_use]
    pub fn merged(&self, options: &SelectOptions) -> Self {
        let mut config = self.clone();
        if let Some(parallel) = options.parallel {
            config.parallel = parallel;
        }
        if let Some(strict) = options.strict_data {
            config.strict_data = strict;
        }
        config
    }

    /// Checks that the values can drive a collection.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if `shard_size` or `max_threads`
    /// is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.shard_size == 0 {
            return Err(CoreError::invalid_config("shard_size must be at least 1"));
        }
        if self.max_threads == 0 {
            return Err(CoreError::invalid_config("max_threads must be at least 1"));
        }
        Ok(())
    }
}

/// Per-collection overrides passed to [`crate::Database::select_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOptions {
    /// Overrides [`Config::parallel`].
    pub parallel: Option<bool>,
    /// Overrides [`Config::strict_data`].
    pub strict_data: Option<bool>,
}

impl SelectOptions {
    /// Creates options that override nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `search` use the parallel path.
    #[must_use]
    pub const fn parallel(mut self, value: bool) -> Self {
        self.parallel = Some(value);
        self
    }

    /// Enables or disables schema coercion.
    #[must_use]
    pub const fn strict_data(mut self, value: bool) -> Self {
        self.strict_data = Some(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert!(config.strict_data);
        assert!(!config.parallel);
        assert_eq!(config.shard_size, 5000);
        assert_eq!(config.cache_limit, 10);
        assert!(config.max_threads >= 3 && config.max_threads <= 10);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .shard_size(100)
            .cache_limit(2)
            .max_threads(4)
            .parallel(true);

        assert_eq!(config.shard_size, 100);
        assert_eq!(config.cache_limit, 2);
        assert_eq!(config.max_threads, 4);
        assert!(config.parallel);
    }

    #[test]
    fn select_options_override() {
        let base = Config::new().strict_data(true);
        let merged = base.merged(&SelectOptions::new().parallel(true).strict_data(false));
        assert!(merged.parallel);
        assert!(!merged.strict_data);

        let untouched = base.merged(&SelectOptions::new());
        assert_eq!(untouched, base);
    }

    #[test]
    fn validation_rejects_zero_sizes() {
        assert!(Config::new().validate().is_ok());
        assert!(Config::new().shard_size(0).validate().is_err());
        assert!(Config::new().max_threads(0).validate().is_err());
        assert!(Config::new().cache_limit(0).validate().is_ok());
    }
}
