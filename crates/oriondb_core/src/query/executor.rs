//! Record operations on a collection.

use crate::collection::Collection;
use crate::error::CoreResult;
use crate::query::{matches, MatchHit, ParallelSearch, RecordSet};
use oriondb_codec::{Record, Value};
use regex::Regex;
use std::sync::Arc;

impl Collection {
    /// Inserts one record.
    pub fn insert(&self, record: Record) -> CoreResult<()> {
        self.insert_many([record]).map(|_| ())
    }

    /// Appends records to the latest shard, rolling over to new shards as
    /// each one fills up. Returns how many records were stored.
    ///
    /// In strict mode with a non-empty schema every record is coerced first.
    /// A shard already at capacity is left untouched. Shards are written one
    /// at a time, so a failure part-way through leaves earlier shards
    /// written.
    pub fn insert_many<I>(&self, records: I) -> CoreResult<usize>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut pending = records.into_iter().peekable();
        if pending.peek().is_none() {
            return Ok(0);
        }

        let strict = self.config.strict_data && !self.schema.is_empty();
        let mut shard = self.store.latest_shard()?;
        let mut data = Arc::unwrap_or_clone(self.read_shard(&shard)?);
        let mut inserted = 0;

        loop {
            let room = self.config.shard_size.saturating_sub(data.len());
            if room > 0 {
                let before = data.len();
                data.extend(pending.by_ref().take(room).map(|record| {
                    if strict {
                        self.schema.coerce(record)
                    } else {
                        record
                    }
                }));
                inserted += data.len() - before;
                self.write_shard(&shard, data)?;
            }

            if pending.peek().is_none() {
                break;
            }
            shard = self.create_shard()?;
            data = Vec::new();
        }

        self.stats.record_inserted(inserted);
        tracing::debug!(collection = %self.name(), inserted, last_shard = %shard, "insert complete");
        Ok(inserted)
    }

    /// Returns every record matching `query`, taking the parallel path if the
    /// collection was selected with `parallel` enabled.
    pub fn search(&self, query: &Record) -> CoreResult<Vec<Record>> {
        if self.config.parallel {
            self.search_parallel(query)?.wait()
        } else {
            self.search_serial(query)
        }
    }

    /// Scans shards one after another through the cache.
    ///
    /// Results come back in shard order, then record order.
    pub fn search_serial(&self, query: &Record) -> CoreResult<Vec<Record>> {
        self.stats.record_scan();
        let mut found = Vec::new();
        for shard in self.store.list_shards()? {
            let data = self.read_shard(&shard)?;
            found.extend(data.iter().filter(|r| matches(r, query)).cloned());
        }
        tracing::debug!(collection = %self.name(), found = found.len(), "serial search complete");
        Ok(found)
    }

    /// Starts a scan over a bounded pool of worker threads.
    ///
    /// The workers bypass the cache. See [`ParallelSearch`] for ordering and
    /// failure behaviour.
    pub fn search_parallel(&self, query: &Record) -> CoreResult<ParallelSearch> {
        self.stats.record_scan();
        let shards = self.store.list_shards()?;
        ParallelSearch::spawn(
            self.store.clone(),
            shards,
            query.clone(),
            self.config.max_threads,
        )
    }

    /// Tests one field of every record against a regular expression.
    ///
    /// Records without the field never match. Values that are not text are
    /// matched against their textual form, so `42` matches `^4`.
    pub fn match_field(&self, field: &str, pattern: &Regex) -> CoreResult<Vec<MatchHit>> {
        self.stats.record_scan();
        let mut hits = Vec::new();
        for shard in self.store.list_shards()? {
            let data = self.read_shard(&shard)?;
            for (index, record) in data.iter().enumerate() {
                let is_hit = match record.get(field) {
                    Some(Value::Text(text)) => pattern.is_match(text),
                    Some(other) => pattern.is_match(&other.to_text()),
                    None => false,
                };
                if is_hit {
                    hits.push(MatchHit {
                        shard: shard.clone(),
                        index,
                        record: record.clone(),
                    });
                }
            }
        }
        tracing::debug!(collection = %self.name(), field, hits = hits.len(), "field match complete");
        Ok(hits)
    }

    /// Compiles `pattern` and runs [`Collection::match_field`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidPattern`] if the pattern does not
    /// compile.
    pub fn match_pattern(&self, field: &str, pattern: &str) -> CoreResult<Vec<MatchHit>> {
        let pattern = Regex::new(pattern)?;
        self.match_field(field, &pattern)
    }

    /// Merges `patch` into every record matching `query` and returns how
    /// many records matched.
    ///
    /// Fields in the patch overwrite or extend the record; no field is ever
    /// removed. A shard is rewritten only if one of its records changed.
    pub fn update(&self, query: &Record, patch: &Record) -> CoreResult<usize> {
        let mut matched = 0;
        for shard in self.store.list_shards()? {
            let data = self.read_shard(&shard)?;
            if !data.iter().any(|r| matches(r, query)) {
                continue;
            }

            let mut records = Arc::unwrap_or_clone(data);
            let mut changed = false;
            for record in records.iter_mut().filter(|r| matches(r, query)) {
                matched += 1;
                changed |= record.merge(patch);
            }
            if changed {
                self.write_shard(&shard, records)?;
            }
        }

        self.stats.record_updated(matched);
        tracing::debug!(collection = %self.name(), matched, "update complete");
        Ok(matched)
    }

    /// Deletes every record matching `query` and returns how many went.
    ///
    /// Shards that lose no records are not rewritten. Emptied shards stay in
    /// place.
    pub fn remove(&self, query: &Record) -> CoreResult<usize> {
        let mut removed = 0;
        for shard in self.store.list_shards()? {
            let data = self.read_shard(&shard)?;
            let kept: Vec<Record> = data.iter().filter(|r| !matches(r, query)).cloned().collect();
            if kept.len() == data.len() {
                continue;
            }
            removed += data.len() - kept.len();
            self.write_shard(&shard, kept)?;
        }

        self.stats.record_removed(removed);
        tracing::debug!(collection = %self.name(), removed, "remove complete");
        Ok(removed)
    }

    /// Reads every record, either as one list or grouped by shard.
    pub fn get(&self, flatten: bool) -> CoreResult<RecordSet> {
        let mut shards = Vec::new();
        for shard in self.store.list_shards()? {
            shards.push(Arc::unwrap_or_clone(self.read_shard(&shard)?));
        }
        Ok(if flatten {
            RecordSet::Flat(shards.into_iter().flatten().collect())
        } else {
            RecordSet::ByShard(shards)
        })
    }

    /// Counts the records in all shards.
    pub fn count(&self) -> CoreResult<usize> {
        let mut total = 0;
        for shard in self.store.list_shards()? {
            total += self.read_shard(&shard)?.len();
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use crate::collection::Collection;
    use crate::config::Config;
    use crate::error::CoreError;
    use crate::schema::Schema;
    use crate::shard::ShardName;
    use oriondb_codec::{record, Record, Value};
    use oriondb_storage::{InMemoryBackend, StorageBackend};
    use std::sync::Arc;

    fn small(shard_size: usize) -> Collection {
        Collection::open_in_memory("items", Config::new().shard_size(shard_size)).unwrap()
    }

    fn numbered(range: std::ops::Range<i64>) -> Vec<Record> {
        range.map(|i| record! { "id" => i, "even" => i % 2 == 0 }).collect()
    }

    fn shard_sizes(collection: &Collection) -> Vec<usize> {
        match collection.get(false).unwrap() {
            crate::query::RecordSet::ByShard(shards) => shards.iter().map(Vec::len).collect(),
            crate::query::RecordSet::Flat(_) => unreachable!(),
        }
    }

    #[test]
    fn insert_fills_shards_in_order() {
        let items = small(4);
        assert_eq!(items.insert_many(numbered(0..10)).unwrap(), 10);

        assert_eq!(shard_sizes(&items), [4, 4, 2]);
        let ids: Vec<i64> = items
            .get(true)
            .unwrap()
            .into_flat()
            .iter()
            .filter_map(|r| r.get("id")?.as_integer())
            .collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn stray_shard_file_does_not_break_rollover() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.write("notes.shard", b"[]").unwrap();
        let items = Collection::open("items", backend.clone(), Config::new().shard_size(2)).unwrap();

        for record in numbered(0..6) {
            items.insert(record).unwrap();
        }

        let names: Vec<String> = items
            .shard_names()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, ["notes.shard", "data_1.shard", "data_2.shard", "data_3.shard"]);
        assert_eq!(shard_sizes(&items), [0, 2, 2, 2]);
        assert_eq!(backend.read("notes.shard").unwrap(), b"[]");
    }

    #[test]
    fn insert_appends_to_partial_shard() {
        let items = small(5);
        items.insert_many(numbered(0..3)).unwrap();
        items.insert_many(numbered(3..6)).unwrap();
        items.insert(record! { "id" => 6 }).unwrap();

        assert_eq!(shard_sizes(&items), [5, 2]);
        assert_eq!(items.count().unwrap(), 7);
    }

    #[test]
    fn exact_fill_does_not_open_a_new_shard() {
        let items = small(3);
        items.insert_many(numbered(0..3)).unwrap();
        assert_eq!(items.shard_names().unwrap().len(), 1);

        items.insert(record! { "id" => 3 }).unwrap();
        assert_eq!(shard_sizes(&items), [3, 1]);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let items = small(3);
        assert_eq!(items.insert_many(Vec::new()).unwrap(), 0);
        assert!(items.shard_names().unwrap().is_empty());
    }

    #[test]
    fn overfull_shard_is_left_alone() {
        let backend = Arc::new(InMemoryBackend::new());
        let items = Collection::open("items", backend.clone(), Config::new().shard_size(2)).unwrap();
        backend
            .write("data_1.shard", br#"[{"id":1},{"id":2},{"id":3}]"#)
            .unwrap();

        items.insert(record! { "id" => 4 }).unwrap();
        assert_eq!(
            backend.read("data_1.shard").unwrap(),
            br#"[{"id":1},{"id":2},{"id":3}]"#
        );
        assert_eq!(shard_sizes(&items), [3, 1]);
    }

    #[test]
    fn strict_mode_coerces_inserts() {
        let backend = Arc::new(InMemoryBackend::new());
        Schema::from_fields([("id", "INT"), ("name", "STRING")])
            .save(backend.as_ref())
            .unwrap();
        let items = Collection::open("items", backend.clone(), Config::default()).unwrap();

        items.insert(record! { "id" => "42", "name" => 7, "junk" => true }).unwrap();
        let stored = items.get(true).unwrap().into_flat();
        assert_eq!(stored, vec![record! { "id" => 42, "name" => "7" }]);
    }

    #[test]
    fn loose_mode_keeps_records_verbatim() {
        let backend = Arc::new(InMemoryBackend::new());
        Schema::from_fields([("id", "INT")]).save(backend.as_ref()).unwrap();
        let items =
            Collection::open("items", backend.clone(), Config::new().strict_data(false)).unwrap();

        let input = record! { "id" => "42", "junk" => true };
        items.insert(input.clone()).unwrap();
        assert_eq!(items.get(true).unwrap().into_flat(), vec![input]);
    }

    #[test]
    fn serial_search_filters_in_order() {
        let items = small(3);
        items.insert_many(numbered(0..8)).unwrap();

        let found = items.search_serial(&record! { "even" => true }).unwrap();
        let ids: Vec<i64> = found.iter().filter_map(|r| r.get("id")?.as_integer()).collect();
        assert_eq!(ids, [0, 2, 4, 6]);

        assert_eq!(items.search(&record! {}).unwrap().len(), 8);
        assert!(items.search(&record! { "id" => 100 }).unwrap().is_empty());
    }

    #[test]
    fn parallel_search_agrees_with_serial() {
        let items = Collection::open_in_memory(
            "items",
            Config::new().shard_size(3).parallel(true).max_threads(2),
        )
        .unwrap();
        items.insert_many(numbered(0..20)).unwrap();

        let query = record! { "even" => false };
        let mut parallel = items.search(&query).unwrap();
        let serial = items.search_serial(&query).unwrap();
        parallel.sort_by_key(|r| r.get("id").and_then(Value::as_integer));
        assert_eq!(parallel, serial);
    }

    #[test]
    fn parallel_search_reports_corruption() {
        let backend = Arc::new(InMemoryBackend::new());
        let items = Collection::open("items", backend.clone(), Config::new().shard_size(2)).unwrap();
        items.insert_many(numbered(0..6)).unwrap();
        backend.write("data_2.shard", b"garbage").unwrap();

        let err = items.search_parallel(&record! {}).unwrap().wait().unwrap_err();
        assert!(matches!(err, CoreError::WorkerFailure { ref shard, .. } if shard == "data_2.shard"));
    }

    #[test]
    fn match_field_reports_positions() {
        let items = small(2);
        items
            .insert_many(vec![
                record! { "name" => "alice" },
                record! { "name" => "bob" },
                record! { "other" => "alfred" },
                record! { "name" => "alan", "n" => 42 },
            ])
            .unwrap();

        let hits = items.match_pattern("name", "^al").unwrap();
        let positions: Vec<(String, usize)> = hits
            .iter()
            .map(|h| (h.shard.to_string(), h.index))
            .collect();
        assert_eq!(
            positions,
            [("data_1.shard".to_owned(), 0), ("data_2.shard".to_owned(), 1)]
        );

        let numeric = items.match_pattern("n", "^4").unwrap();
        assert_eq!(numeric.len(), 1);
        assert_eq!(numeric[0].shard, ShardName::for_index(2));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let items = small(2);
        let err = items.match_pattern("name", "(unclosed").unwrap_err();
        assert!(matches!(err, CoreError::InvalidPattern(_)));
    }

    #[test]
    fn update_merges_and_counts() {
        let items = small(3);
        items.insert_many(numbered(0..6)).unwrap();

        let matched = items
            .update(&record! { "even" => true }, &record! { "flag" => true })
            .unwrap();
        assert_eq!(matched, 3);

        let flagged = items.search(&record! { "flag" => true }).unwrap();
        assert_eq!(flagged.len(), 3);
        assert!(flagged.iter().all(|r| r.get("even") == Some(&Value::Bool(true))));
    }

    #[test]
    fn unchanged_update_skips_write() {
        let items = small(3);
        items.insert_many(numbered(0..3)).unwrap();
        let writes = items.stats().shard_writes;

        let matched = items
            .update(&record! { "id" => 1 }, &record! { "even" => false })
            .unwrap();
        assert_eq!(matched, 1);
        assert_eq!(items.stats().shard_writes, writes);
    }

    #[test]
    fn float_patch_replaces_integer() {
        let items = small(3);
        items.insert(record! { "id" => 1, "score" => 2 }).unwrap();
        let writes = items.stats().shard_writes;

        let matched = items
            .update(&record! { "id" => 1 }, &record! { "score" => 2.0 })
            .unwrap();
        assert_eq!(matched, 1);
        assert_eq!(items.stats().shard_writes, writes + 1);

        items.clear_cache();
        let stored = items.get(true).unwrap().into_flat();
        assert!(matches!(stored[0].get("score"), Some(Value::Float(f)) if *f == 2.0));
    }

    #[test]
    fn remove_deletes_matches_only() {
        let items = small(4);
        items.insert_many(numbered(0..10)).unwrap();

        assert_eq!(items.remove(&record! { "even" => true }).unwrap(), 5);
        assert_eq!(items.count().unwrap(), 5);
        assert!(items.search(&record! { "even" => true }).unwrap().is_empty());

        // Nothing left to remove.
        let writes = items.stats().shard_writes;
        assert_eq!(items.remove(&record! { "even" => true }).unwrap(), 0);
        assert_eq!(items.stats().shard_writes, writes);
    }

    #[test]
    fn remove_everything_keeps_shards() {
        let items = small(2);
        items.insert_many(numbered(0..4)).unwrap();

        assert_eq!(items.remove(&record! {}).unwrap(), 4);
        assert_eq!(items.shard_names().unwrap().len(), 2);
        assert!(items.get(true).unwrap().is_empty());
    }

    #[test]
    fn stats_track_operations() {
        let items = small(2);
        items.insert_many(numbered(0..5)).unwrap();
        items.update(&record! { "id" => 0 }, &record! { "x" => 1 }).unwrap();
        items.remove(&record! { "id" => 4 }).unwrap();
        items.search_serial(&record! {}).unwrap();

        let stats = items.stats();
        assert_eq!(stats.records_inserted, 5);
        assert_eq!(stats.records_updated, 1);
        assert_eq!(stats.records_removed, 1);
        assert_eq!(stats.shards_created, 3);
        assert_eq!(stats.scans, 1);
    }
}
