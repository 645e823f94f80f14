//! Cross-crate integration test helpers.
//!
//! [`IntegrationHarness`] drives a real collection alongside a plain vector
//! model of what the collection should contain, so a test can apply any
//! sequence of operations and then check the two agree.

use crate::generators::CollectionOperation;
use oriondb_codec::{Record, Value};
use oriondb_core::{matches, Collection, CollectionStats, Config, Database, RecordSet, ShardStore};
use oriondb_storage::DirectoryBackend;
use std::sync::Arc;
use tempfile::TempDir;

const HARNESS_COLLECTION: &str = "harness";

/// A collection paired with a model of its expected content.
pub struct IntegrationHarness {
    /// The collection under test.
    pub collection: Collection,
    /// Expected records in collection order.
    model: Vec<Record>,
    temp_dir: TempDir,
}

impl IntegrationHarness {
    /// Creates a harness over a fresh on-disk collection.
    ///
    /// Strict mode is irrelevant here: the collection has an empty schema, so
    /// records are stored as given.
    pub fn new(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open_with_config(temp_dir.path(), config)
            .expect("Failed to open database");
        let collection = db
            .select(HARNESS_COLLECTION)
            .expect("Failed to select collection");
        Self {
            collection,
            model: Vec::new(),
            temp_dir,
        }
    }

    /// Applies an operation to both the collection and the model.
    pub fn apply(&mut self, op: &CollectionOperation) {
        match op {
            CollectionOperation::Insert(records) => {
                let inserted = self
                    .collection
                    .insert_many(records.iter().cloned())
                    .expect("Failed to insert");
                assert_eq!(inserted, records.len());
                self.model.extend(records.iter().cloned());
            }
            CollectionOperation::Update { query, patch } => {
                let matched = self.collection.update(query, patch).expect("Failed to update");
                let mut expected = 0;
                for record in self.model.iter_mut().filter(|r| matches(r, query)) {
                    record.merge(patch);
                    expected += 1;
                }
                assert_eq!(matched, expected, "update count for {query:?}");
            }
            CollectionOperation::Remove { query } => {
                let removed = self.collection.remove(query).expect("Failed to remove");
                let before = self.model.len();
                self.model.retain(|r| !matches(r, query));
                assert_eq!(removed, before - self.model.len(), "remove count for {query:?}");
            }
        }
    }

    /// Records the model expects to match `query`, in collection order.
    pub fn expected(&self, query: &Record) -> Vec<Record> {
        self.model.iter().filter(|r| matches(r, query)).cloned().collect()
    }

    /// Decodes every shard straight from disk, bypassing the collection's
    /// cache.
    pub fn shards_on_disk(&self) -> Vec<Vec<Record>> {
        let path = self.temp_dir.path().join(HARNESS_COLLECTION);
        let backend = DirectoryBackend::open(&path, false).expect("Failed to open collection");
        let store = ShardStore::new(Arc::new(backend), Arc::new(CollectionStats::new()));
        store
            .list_shards()
            .expect("Failed to list shards")
            .iter()
            .map(|shard| store.read(shard).expect("Failed to read shard"))
            .collect()
    }

    /// Shard contents as the collection sees them, through its cache.
    pub fn shards_cached(&self) -> Vec<Vec<Record>> {
        match self.collection.get(false).expect("Failed to read") {
            RecordSet::ByShard(shards) => shards,
            RecordSet::Flat(_) => unreachable!("get(false) groups by shard"),
        }
    }

    /// Checks full content against the model, cached shards against the
    /// files on disk, and every shard against its capacity.
    pub fn verify_all(&self) {
        let stored = self.collection.get(true).expect("Failed to read").into_flat();
        assert_eq!(stored, self.model, "collection content diverged from model");

        let shards = self.shards_cached();
        assert_eq!(shards, self.shards_on_disk(), "cache diverged from disk");

        let shard_size = self.collection.config().shard_size;
        for shard in &shards {
            assert!(shard.len() <= shard_size, "shard over capacity");
        }
    }

    /// Returns the number of modelled records.
    pub fn tracked_count(&self) -> usize {
        self.model.len()
    }
}

/// Sorts records by their `id` field, then by encoded form, for comparing
/// unordered result sets.
pub fn sorted(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by_cached_key(|r| {
        let id = r.get("id").map(Value::to_text).unwrap_or_default();
        (id, oriondb_codec::encode_record(r).unwrap_or_default())
    });
    records
}

/// End-to-end scenarios.
pub mod scenario {
    use super::*;
    use crate::fixtures::{numbered_record, TestDatabase};
    use oriondb_codec::record;

    /// Inserts 12,000 records into shards of 5,000, then finds, flags and
    /// removes a single record by id.
    pub fn twelve_thousand_records(parallel: bool) {
        let test_db = TestDatabase::with_config(Config::new().parallel(parallel));
        let users = test_db.collection("users");

        let inserted = users
            .insert_many((0..12_000).map(numbered_record))
            .expect("Failed to insert");
        assert_eq!(inserted, 12_000);

        let sizes: Vec<usize> = match users.get(false).expect("Failed to read") {
            RecordSet::ByShard(shards) => shards.iter().map(Vec::len).collect(),
            RecordSet::Flat(_) => unreachable!(),
        };
        assert_eq!(sizes, [5000, 5000, 2000]);

        let target = record! { "id" => 7777 };
        let found = users.search(&target).expect("Failed to search");
        assert_eq!(found, vec![numbered_record(7777)]);

        let matched = users
            .update(&target, &record! { "flag" => true })
            .expect("Failed to update");
        assert_eq!(matched, 1);
        let found = users.search(&target).expect("Failed to search");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("flag"), Some(&Value::Bool(true)));

        let removed = users.remove(&target).expect("Failed to remove");
        assert_eq!(removed, 1);
        assert!(users.search(&target).expect("Failed to search").is_empty());
        assert_eq!(users.count().expect("Failed to count"), 11_999);
    }

    /// Checks that a record written by one handle is read back unchanged by
    /// a fresh handle on the same directory.
    pub fn persistence_round_trip(record: Record) {
        let test_db = TestDatabase::new();
        test_db
            .collection("docs")
            .insert(record.clone())
            .expect("Failed to insert");

        let reopened = Database::open(test_db.path()).expect("Failed to reopen");
        let docs = reopened.select("docs").expect("Failed to select");
        let stored = docs.get(true).expect("Failed to read").into_flat();
        assert_eq!(stored, vec![record]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{numbered_record, scenarios, TestDatabase};
    use crate::generators::{
        operation_sequence_strategy, query_strategy, queryable_record_strategy, record_strategy,
        PropTestConfig,
    };
    use oriondb_codec::record;
    use oriondb_core::CoreError;
    use proptest::prelude::*;

    #[test]
    fn twelve_thousand_serial() {
        scenario::twelve_thousand_records(false);
    }

    #[test]
    fn twelve_thousand_parallel() {
        scenario::twelve_thousand_records(true);
    }

    #[test]
    fn rollover_at_capacity_plus_one() {
        let test_db = TestDatabase::with_config(Config::new().shard_size(50));
        let items = test_db.collection("items");
        items.insert_many((0..51).map(numbered_record)).unwrap();

        let shards = items.shard_names().unwrap();
        assert_eq!(shards.len(), 2);
        assert_eq!(items.search(&record! { "id" => 50 }).unwrap().len(), 1);
        assert_eq!(items.count().unwrap(), 51);
    }

    #[test]
    fn cache_stays_bounded() {
        let test_db = TestDatabase::with_config(Config::new().shard_size(5).cache_limit(3));
        let items = test_db.collection("items");
        items.insert_many((0..60).map(numbered_record)).unwrap();

        assert_eq!(items.shard_names().unwrap().len(), 12);
        assert!(items.cached_shards().len() <= 3);
        items.search_serial(&record! {}).unwrap();
        assert!(items.cached_shards().len() <= 3);
    }

    #[test]
    fn cache_is_transparent() {
        let cached = scenarios::populated_database(40, 7);
        let uncached = TestDatabase::with_config(Config::new().shard_size(7).cache_limit(0));
        uncached
            .collection("items")
            .insert_many((0..40).map(numbered_record))
            .unwrap();

        let a = cached.collection("items");
        let b = uncached.collection("items");
        for query in [record! {}, record! { "even" => true }, record! { "id" => 13 }] {
            assert_eq!(a.search_serial(&query).unwrap(), b.search_serial(&query).unwrap());
        }
        assert_eq!(b.stats().cache_hits, 0);
    }

    #[test]
    fn corruption_is_reported_not_hidden() {
        let test_db = scenarios::populated_database(20, 5);
        std::fs::write(test_db.path().join("items").join("data_3.shard"), b"[{\"id\":").unwrap();

        let items = test_db.collection("items");
        assert!(items.search_serial(&record! {}).unwrap_err().is_corrupt_shard());

        let parallel = items.search_parallel(&record! {}).unwrap().wait();
        assert!(matches!(parallel, Err(CoreError::WorkerFailure { .. })));
    }

    #[test]
    fn harness_tracks_operations() {
        let mut harness = IntegrationHarness::new(Config::new().shard_size(4));
        harness.apply(&CollectionOperation::Insert((0..10).map(numbered_record).collect()));
        harness.apply(&CollectionOperation::Update {
            query: record! { "even" => true },
            patch: record! { "flag" => 1 },
        });
        harness.apply(&CollectionOperation::Remove {
            query: record! { "flag" => 1 },
        });

        assert_eq!(harness.tracked_count(), 5);
        harness.verify_all();

        let odd = record! { "even" => false };
        assert_eq!(harness.collection.search(&odd).unwrap(), harness.expected(&odd));
    }

    #[test]
    fn cache_follows_updates_and_removals() {
        let mut harness = IntegrationHarness::new(Config::new().shard_size(3).cache_limit(2));
        harness.apply(&CollectionOperation::Insert((0..10).map(numbered_record).collect()));
        assert_eq!(harness.shards_cached(), harness.shards_on_disk());

        harness.apply(&CollectionOperation::Update {
            query: record! { "id" => 4 },
            patch: record! { "name" => "renamed" },
        });
        assert_eq!(harness.shards_cached(), harness.shards_on_disk());

        harness.apply(&CollectionOperation::Remove {
            query: record! { "even" => false },
        });
        assert_eq!(harness.shards_cached(), harness.shards_on_disk());
        assert!(harness.collection.cached_shards().len() <= 2);

        let on_disk: usize = harness.shards_on_disk().iter().map(Vec::len).sum();
        assert_eq!(on_disk, 5);
        harness.verify_all();
    }

    #[test]
    fn sorted_orders_by_id() {
        let records = vec![numbered_record(3), numbered_record(1), numbered_record(2)];
        let ids: Vec<i64> = sorted(records)
            .iter()
            .filter_map(|r| r.get("id")?.as_integer())
            .collect();
        assert_eq!(ids, [1, 2, 3]);
    }

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn records_round_trip(record in record_strategy()) {
            scenario::persistence_round_trip(record);
        }

        #[test]
        fn operations_agree_with_model(ops in operation_sequence_strategy(1, 12)) {
            let mut harness = IntegrationHarness::new(Config::new().shard_size(5).cache_limit(2));
            for op in &ops {
                harness.apply(op);
            }
            harness.verify_all();
        }

        #[test]
        fn cached_reads_match_disk(
            ops in operation_sequence_strategy(1, 12),
            query in query_strategy(),
        ) {
            let mut harness = IntegrationHarness::new(Config::new().shard_size(3).cache_limit(2));
            for op in &ops {
                harness.apply(op);
                prop_assert_eq!(harness.shards_cached(), harness.shards_on_disk());

                // Touch shards in a different order before the next write.
                harness.collection.search_serial(&query).unwrap();
                prop_assert_eq!(harness.shards_cached(), harness.shards_on_disk());
                prop_assert!(harness.collection.cached_shards().len() <= 2);
            }
        }

        #[test]
        fn serial_and_parallel_scans_agree(
            records in prop::collection::vec(queryable_record_strategy(), 0..40),
            query in query_strategy(),
        ) {
            let test_db = TestDatabase::with_config(Config::new().shard_size(6).max_threads(3));
            let items = test_db.collection("items");
            items.insert_many(records.clone()).unwrap();

            let serial = items.search_serial(&query).unwrap();
            let parallel = items.search_parallel(&query).unwrap().wait().unwrap();
            let expected: Vec<Record> = records.into_iter().filter(|r| matches(r, &query)).collect();

            prop_assert_eq!(&serial, &expected);
            prop_assert_eq!(sorted(parallel), sorted(serial));
        }

        #[test]
        fn removal_is_idempotent(
            records in prop::collection::vec(queryable_record_strategy(), 0..30),
            query in query_strategy(),
        ) {
            let mut harness = IntegrationHarness::new(Config::new().shard_size(4));
            harness.apply(&CollectionOperation::Insert(records));
            harness.apply(&CollectionOperation::Remove { query: query.clone() });
            let writes = harness.collection.stats().shard_writes;

            prop_assert_eq!(harness.collection.remove(&query).unwrap(), 0);
            prop_assert_eq!(harness.collection.stats().shard_writes, writes);
            prop_assert!(harness.collection.search_serial(&query).unwrap().is_empty());
        }
    }
}
