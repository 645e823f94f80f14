//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common test scenarios.

use oriondb_codec::{record, Record};
use oriondb_core::{Collection, Config, Database, Schema};
use oriondb_storage::DirectoryBackend;
use std::path::Path;
use tempfile::TempDir;

/// A database in a temporary directory, removed on drop.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestDatabase {
    /// Creates a database with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a database with custom configuration.
    pub fn with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open_with_config(temp_dir.path(), config)
            .expect("Failed to open test database");
        Self { db, temp_dir }
    }

    /// Returns the database root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `schema.json` for a collection before it is first selected.
    pub fn write_schema(&self, collection: &str, schema: &Schema) {
        let backend = DirectoryBackend::open(&self.path().join(collection), true)
            .expect("Failed to open collection directory");
        schema.save(&backend).expect("Failed to write schema");
    }

    /// Selects a collection, panicking on failure.
    pub fn collection(&self, name: &str) -> Collection {
        self.db.select(name).expect("Failed to select collection")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary database.
///
/// # Example
///
/// ```rust
/// use oriondb_codec::record;
/// use oriondb_testkit::with_temp_db;
///
/// with_temp_db(|db| {
///     let users = db.select("users").unwrap();
///     users.insert(record! { "id" => 1 }).unwrap();
///     assert_eq!(users.count().unwrap(), 1);
/// });
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::new();
    f(&test_db.db)
}

/// The record `{ "id": i, "name": "user<i>", "even": i % 2 == 0 }`.
pub fn numbered_record(i: i64) -> Record {
    record! {
        "id" => i,
        "name" => format!("user{i}"),
        "even" => i % 2 == 0,
    }
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a database whose `items` collection holds `count` numbered
    /// records spread over shards of `shard_size`.
    pub fn populated_database(count: usize, shard_size: usize) -> TestDatabase {
        let test_db = TestDatabase::with_config(Config::new().shard_size(shard_size));
        let items = test_db.collection("items");
        let records = (0..count as i64).map(numbered_record);
        let inserted = items.insert_many(records).expect("Failed to insert records");
        assert_eq!(inserted, count);
        test_db
    }

    /// Creates a database with `collection_count` collections of one record
    /// each.
    pub fn multi_collection_database(collection_count: usize) -> (TestDatabase, Vec<String>) {
        let test_db = TestDatabase::new();
        let mut names = Vec::with_capacity(collection_count);

        for i in 0..collection_count {
            let name = format!("collection_{i}");
            test_db
                .collection(&name)
                .insert(numbered_record(i as i64))
                .expect("Failed to insert record");
            names.push(name);
        }

        (test_db, names)
    }
}
