//! Shard store: naming, discovery and full-content persistence of shards.

use crate::error::{CoreError, CoreResult};
use crate::shard::name::ShardName;
use crate::stats::CollectionStats;
use oriondb_codec::{decode_records, encode_records, Record};
use oriondb_storage::StorageBackend;
use std::sync::Arc;

/// Manages the set of shard files of one collection.
///
/// The store talks to the storage backend directly and never caches; the
/// collection layers a [`crate::shard::ShardCache`] on top. Cloning is cheap
/// and clones share the backend, which is how parallel-scan workers get
/// read access without touching the cache.
///
/// A single writer per collection is assumed: two processes creating shards
/// in the same directory may pick the same index.
#[derive(Clone)]
pub struct ShardStore {
    backend: Arc<dyn StorageBackend>,
    stats: Arc<CollectionStats>,
}

impl ShardStore {
    /// Creates a shard store over a backend.
    pub fn new(backend: Arc<dyn StorageBackend>, stats: Arc<CollectionStats>) -> Self {
        Self { backend, stats }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Lists every shard, ordered by shard index.
    pub fn list_shards(&self) -> CoreResult<Vec<ShardName>> {
        let mut shards: Vec<ShardName> = self
            .backend
            .list()?
            .iter()
            .filter_map(|name| ShardName::parse(name))
            .collect();
        shards.sort();
        Ok(shards)
    }

    /// Returns the shard that receives appends, creating the first shard if
    /// the collection has none.
    ///
    /// Only `data_<n>.shard` files take appends. Other `*.shard` files are
    /// still listed and scanned but never grow.
    pub fn latest_shard(&self) -> CoreResult<ShardName> {
        match self.list_shards()?.into_iter().rfind(|s| s.index().is_some()) {
            Some(shard) => Ok(shard),
            None => self.create_shard(),
        }
    }

    /// Allocates the next shard and writes it out empty.
    ///
    /// The new index is the number of indexed shards plus one. If a file
    /// already holds that name, the index above the highest existing one is
    /// used instead so no data is overwritten.
    pub fn create_shard(&self) -> CoreResult<ShardName> {
        let indices: Vec<u64> = self
            .list_shards()?
            .iter()
            .filter_map(ShardName::index)
            .collect();
        let mut index = indices.len() as u64 + 1;
        let candidate = ShardName::for_index(index);
        if indices.contains(&index) {
            let highest = indices.iter().copied().max().unwrap_or(0);
            tracing::warn!(
                shard = %candidate,
                highest,
                "shard count out of step with shard names, skipping ahead"
            );
            index = highest + 1;
        }

        let shard = ShardName::for_index(index);
        self.write(&shard, &[])?;
        self.stats.record_shard_created();
        tracing::debug!(shard = %shard, location = %self.backend.location(), "created shard");
        Ok(shard)
    }

    /// Reads and decodes a whole shard.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptShard`] if the file is not a JSON array of
    /// objects.
    pub fn read(&self, shard: &ShardName) -> CoreResult<Vec<Record>> {
        let bytes = self.backend.read(shard.as_str())?;
        self.stats.record_shard_read();
        decode_records(&bytes).map_err(|e| CoreError::corrupt_shard(shard.as_str(), e.to_string()))
    }

    /// Encodes `records` and replaces the shard's content.
    pub fn write(&self, shard: &ShardName, records: &[Record]) -> CoreResult<()> {
        let bytes = encode_records(records)?;
        self.backend.write(shard.as_str(), &bytes)?;
        self.stats.record_shard_write();
        Ok(())
    }
}

impl std::fmt::Debug for ShardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardStore")
            .field("location", &self.backend.location())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oriondb_codec::record;
    use oriondb_storage::{DirectoryBackend, InMemoryBackend};
    use tempfile::tempdir;

    fn memory_store() -> (ShardStore, Arc<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::new());
        let store = ShardStore::new(backend.clone(), Arc::new(CollectionStats::new()));
        (store, backend)
    }

    #[test]
    fn latest_shard_creates_first_shard() {
        let (store, backend) = memory_store();
        let shard = store.latest_shard().unwrap();
        assert_eq!(shard.as_str(), "data_1.shard");
        assert_eq!(backend.read("data_1.shard").unwrap(), b"[]");

        // Asking again returns the same shard rather than a new one.
        assert_eq!(store.latest_shard().unwrap(), shard);
        assert_eq!(store.list_shards().unwrap().len(), 1);
    }

    #[test]
    fn create_shard_counts_up() {
        let (store, _) = memory_store();
        for expected in 1..=3u64 {
            assert_eq!(store.create_shard().unwrap().index(), Some(expected));
        }
        assert_eq!(store.latest_shard().unwrap().as_str(), "data_3.shard");
    }

    #[test]
    fn create_shard_never_overwrites() {
        let (store, backend) = memory_store();
        backend.write("data_2.shard", br#"[{"keep":true}]"#).unwrap();

        let shard = store.create_shard().unwrap();
        assert_eq!(shard.as_str(), "data_3.shard");
        assert_eq!(backend.read("data_2.shard").unwrap(), br#"[{"keep":true}]"#);
    }

    #[test]
    fn listing_ignores_other_files_and_sorts_numerically() {
        let (store, backend) = memory_store();
        backend.write("schema.json", b"{}").unwrap();
        backend.write("index.json", b"{}").unwrap();
        for i in [10u64, 2, 1] {
            store.write(&ShardName::for_index(i), &[]).unwrap();
        }

        let names: Vec<String> = store
            .list_shards()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, ["data_1.shard", "data_2.shard", "data_10.shard"]);
        assert_eq!(store.latest_shard().unwrap().index(), Some(10));
    }

    #[test]
    fn unindexed_files_never_take_appends() {
        let (store, backend) = memory_store();
        backend.write("notes.shard", b"[]").unwrap();

        let first = store.latest_shard().unwrap();
        assert_eq!(first.as_str(), "data_1.shard");
        assert_eq!(store.create_shard().unwrap().as_str(), "data_2.shard");

        let names: Vec<String> = store
            .list_shards()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, ["notes.shard", "data_1.shard", "data_2.shard"]);
        assert_eq!(store.latest_shard().unwrap().as_str(), "data_2.shard");
    }

    #[test]
    fn write_then_read() {
        let (store, _) = memory_store();
        let shard = ShardName::for_index(1);
        let records = vec![record! { "id" => 1 }, record! { "id" => 2 }];

        store.write(&shard, &records).unwrap();
        assert_eq!(store.read(&shard).unwrap(), records);
    }

    #[test]
    fn corrupt_shard_is_reported() {
        let (store, backend) = memory_store();
        backend.write("data_1.shard", b"[{\"id\": 1},").unwrap();

        let err = store.read(&ShardName::for_index(1)).unwrap_err();
        assert!(matches!(err, CoreError::CorruptShard { ref shard, .. } if shard == "data_1.shard"));
    }

    #[test]
    fn directory_backed_store() {
        let temp = tempdir().unwrap();
        let backend = DirectoryBackend::open(temp.path(), true).unwrap();
        let store = ShardStore::new(Arc::new(backend), Arc::new(CollectionStats::new()));

        let shard = store.latest_shard().unwrap();
        store.write(&shard, &[record! { "name" => "ada" }]).unwrap();

        let text = std::fs::read_to_string(temp.path().join("data_1.shard")).unwrap();
        assert!(text.contains("\"name\": \"ada\""));
        assert_eq!(store.read(&shard).unwrap().len(), 1);
    }
}
