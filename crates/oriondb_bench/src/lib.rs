//! Benchmark utilities.

use oriondb_codec::{record, Record};
use oriondb_core::{Collection, Config, Database};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tempfile::TempDir;

/// Generates a record with a sequential id and random payload fields.
pub fn random_record<R: Rng>(rng: &mut R, id: i64) -> Record {
    let name: String = (0..12).map(|_| char::from(rng.sample(Alphanumeric))).collect();
    record! {
        "id" => id,
        "name" => name,
        "group" => rng.gen_range(0..16i64),
        "score" => rng.gen_range(0.0..100.0f64),
        "active" => rng.gen_bool(0.5),
    }
}

/// Generates `count` records with ids `0..count`.
pub fn generate_records(count: usize) -> Vec<Record> {
    let mut rng = rand::thread_rng();
    (0..count as i64).map(|id| random_record(&mut rng, id)).collect()
}

/// A populated on-disk collection that lives as long as this value.
pub struct BenchCollection {
    /// The collection.
    pub collection: Collection,
    _temp_dir: TempDir,
}

/// Creates an on-disk collection holding `count` generated records.
pub fn populated_collection(count: usize, config: Config) -> BenchCollection {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db = Database::open_with_config(temp_dir.path(), config).expect("Failed to open database");
    let collection = db.select("bench").expect("Failed to select collection");
    collection
        .insert_many(generate_records(count))
        .expect("Failed to populate collection");
    BenchCollection {
        collection,
        _temp_dir: temp_dir,
    }
}
