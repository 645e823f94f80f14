//! Verify command implementation.

use super::open_database;
use oriondb_codec::decode_records;
use oriondb_core::{validate_collection_name, Schema, ShardName, SCHEMA_FILE};
use oriondb_storage::{DirectoryBackend, StorageBackend};
use std::path::Path;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of shards checked.
    pub shards_checked: usize,
    /// Number of records decoded.
    pub records: usize,
    /// Shards that failed to decode.
    pub corrupt_shards: Vec<String>,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.corrupt_shards.is_empty() && self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(path: &Path, collection: &str) -> Result<(), Box<dyn std::error::Error>> {
    validate_collection_name(collection)?;
    open_database(path)?;
    let backend = DirectoryBackend::open(&path.join(collection), false)?;

    println!("Verifying collection {collection} at {}", path.display());
    println!();

    let result = verify_collection(&backend)?;
    println!("Shards checked:  {}", result.shards_checked);
    println!("Records decoded: {}", result.records);
    for error in &result.errors {
        println!("  - {error}");
    }

    println!();
    if result.is_ok() {
        println!("✓ Collection verification passed");
        Ok(())
    } else {
        println!(
            "✗ Collection verification failed ({} corrupt shards)",
            result.corrupt_shards.len()
        );
        Err("Verification failed".into())
    }
}

fn verify_collection(
    backend: &dyn StorageBackend,
) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let mut result = VerifyResult::default();

    if backend.exists(SCHEMA_FILE)? {
        if let Err(e) = serde_json::from_slice::<Schema>(&backend.read(SCHEMA_FILE)?) {
            result.errors.push(format!("{SCHEMA_FILE}: {e}"));
        }
    }

    let mut shards: Vec<ShardName> = backend
        .list()?
        .iter()
        .filter_map(|n| ShardName::parse(n))
        .collect();
    shards.sort();

    for shard in shards {
        result.shards_checked += 1;
        match decode_records(&backend.read(shard.as_str())?) {
            Ok(records) => result.records += records.len(),
            Err(e) => {
                result.errors.push(format!("{shard}: {e}"));
                result.corrupt_shards.push(shard.to_string());
            }
        }
    }
    Ok(result)
}
