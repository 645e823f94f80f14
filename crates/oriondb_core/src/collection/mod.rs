//! Collection handles.
//!
//! A [`Collection`] owns everything needed to work with one collection
//! directory: its configuration, its schema, the shard store and a bounded
//! cache of decoded shards. The record operations themselves (insert, search,
//! update and so on) are implemented in [`crate::query`].
//!
//! # Caching
//!
//! Reads on the caller's thread go through the cache; writes go to storage
//! first and then refresh the cached copy. A failed write drops the cached
//! copy so the next read sees whatever actually reached storage. Parallel
//! scan workers read storage directly.

use crate::config::Config;
use crate::error::CoreResult;
use crate::schema::Schema;
use crate::shard::{ShardCache, ShardData, ShardName, ShardStore};
use crate::stats::{CollectionStats, StatsSnapshot};
use oriondb_codec::Record;
use oriondb_storage::{InMemoryBackend, StorageBackend};
use parking_lot::Mutex;
use std::sync::Arc;

/// Name of the reserved index file inside a collection directory.
pub const INDEX_FILE: &str = "index.json";

/// A handle to one collection.
///
/// `Collection` is `Send + Sync`. Concurrent readers are fine; writes assume
/// this handle is the only writer of its directory.
///
/// ```rust,ignore
/// use oriondb_codec::record;
/// use oriondb_core::Database;
///
/// let db = Database::open("data")?;
/// let users = db.select("users")?;
/// users.insert(record! { "id" => 1, "name" => "ada" })?;
///
/// let found = users.search(&record! { "id" => 1 })?;
/// assert_eq!(found.len(), 1);
/// ```
pub struct Collection {
    name: String,
    pub(crate) config: Config,
    pub(crate) schema: Schema,
    pub(crate) store: ShardStore,
    cache: Mutex<ShardCache>,
    pub(crate) stats: Arc<CollectionStats>,
}

impl Collection {
    /// Opens a collection over a storage backend.
    ///
    /// Creates `schema.json` and `index.json` as `{}` if they are missing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidConfig`] for unusable settings and
    /// [`crate::CoreError::CorruptMetadata`] for a malformed schema.
    pub fn open(
        name: impl Into<String>,
        backend: Arc<dyn StorageBackend>,
        config: Config,
    ) -> CoreResult<Self> {
        let name = name.into();
        config.validate()?;

        let schema = Schema::load_or_init(backend.as_ref())?;
        if !backend.exists(INDEX_FILE)? {
            backend.write(INDEX_FILE, b"{}")?;
        }

        let stats = Arc::new(CollectionStats::new());
        let store = ShardStore::new(backend, Arc::clone(&stats));
        tracing::info!(
            collection = %name,
            location = %store.backend().location(),
            schema_fields = schema.len(),
            "opened collection"
        );

        Ok(Self {
            name,
            cache: Mutex::new(ShardCache::new(config.cache_limit)),
            config,
            schema,
            store,
            stats,
        })
    }

    /// Opens a collection that lives only in memory.
    pub fn open_in_memory(name: impl Into<String>, config: Config) -> CoreResult<Self> {
        Self::open(name, Arc::new(InMemoryBackend::new()), config)
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the schema loaded at open time.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Describes where the collection is stored.
    pub fn location(&self) -> String {
        self.store.backend().location()
    }

    /// Lists the collection's shards in order.
    pub fn shard_names(&self) -> CoreResult<Vec<ShardName>> {
        self.store.list_shards()
    }

    /// Returns a snapshot of the collection's counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Shards currently held in the cache, most recently used first.
    pub fn cached_shards(&self) -> Vec<ShardName> {
        self.cache.lock().keys_by_recency()
    }

    /// Reads a shard through the cache.
    pub(crate) fn read_shard(&self, shard: &ShardName) -> CoreResult<ShardData> {
        if let Some(data) = self.cache.lock().get(shard) {
            self.stats.record_cache_hit();
            return Ok(data);
        }
        self.stats.record_cache_miss();

        let data: ShardData = Arc::new(self.store.read(shard)?);
        self.cache.lock().put(shard.clone(), Arc::clone(&data));
        Ok(data)
    }

    /// Writes a shard to storage and refreshes the cached copy.
    pub(crate) fn write_shard(&self, shard: &ShardName, records: Vec<Record>) -> CoreResult<()> {
        if let Err(err) = self.store.write(shard, &records) {
            self.cache.lock().invalidate(shard);
            return Err(err);
        }
        self.cache.lock().put(shard.clone(), Arc::new(records));
        Ok(())
    }

    /// Allocates a new, empty shard.
    pub(crate) fn create_shard(&self) -> CoreResult<ShardName> {
        let shard = self.store.create_shard()?;
        self.cache.lock().put(shard.clone(), Arc::new(Vec::new()));
        Ok(shard)
    }

    /// Drops every cached shard.
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("location", &self.location())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
