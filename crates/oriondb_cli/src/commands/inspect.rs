//! Inspect command implementation.

use super::{format_size, open_database};
use oriondb_codec::decode_records;
use oriondb_core::{validate_collection_name, Schema, ShardName, SCHEMA_FILE};
use oriondb_storage::{DirectoryBackend, StorageBackend};
use serde::Serialize;
use std::path::Path;

/// Database inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Database path.
    pub path: String,
    /// Per-collection details.
    pub collections: Vec<CollectionReport>,
}

/// Details of one collection.
#[derive(Debug, Serialize)]
pub struct CollectionReport {
    /// Collection name.
    pub name: String,
    /// Declared field kinds, if a schema file exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    /// Shards in order.
    pub shards: Vec<ShardReport>,
    /// Records across all readable shards.
    pub record_count: usize,
    /// Bytes across all shards.
    pub total_size: u64,
}

/// Details of one shard.
#[derive(Debug, Serialize)]
pub struct ShardReport {
    /// Shard file name.
    pub name: String,
    /// File size in bytes.
    pub size: u64,
    /// Number of records, if the shard decodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    /// Decode error, if it doesn't.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the inspect command.
///
/// Inspection is read-only: collections are examined through their
/// directories rather than opened, so no metadata files get created.
pub fn run(
    path: &Path,
    collection: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_database(path)?;
    let names = match collection {
        Some(name) => {
            validate_collection_name(name)?;
            vec![name.to_owned()]
        }
        None => db.collections()?,
    };

    let mut result = InspectResult {
        path: path.display().to_string(),
        collections: Vec::with_capacity(names.len()),
    };
    for name in names {
        let backend = DirectoryBackend::open(&path.join(&name), false)?;
        result.collections.push(inspect_collection(name, &backend)?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_text_output(&result);
    }
    Ok(())
}

fn inspect_collection(
    name: String,
    backend: &dyn StorageBackend,
) -> Result<CollectionReport, Box<dyn std::error::Error>> {
    let schema = if backend.exists(SCHEMA_FILE)? {
        Some(serde_json::from_slice(&backend.read(SCHEMA_FILE)?)?)
    } else {
        None
    };

    let mut shards: Vec<ShardName> = backend
        .list()?
        .iter()
        .filter_map(|n| ShardName::parse(n))
        .collect();
    shards.sort();

    let mut report = CollectionReport {
        name,
        schema,
        shards: Vec::with_capacity(shards.len()),
        record_count: 0,
        total_size: 0,
    };
    for shard in shards {
        let bytes = backend.read(shard.as_str())?;
        let size = bytes.len() as u64;
        let (records, error) = match decode_records(&bytes) {
            Ok(records) => (Some(records.len()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        report.record_count += records.unwrap_or(0);
        report.total_size += size;
        report.shards.push(ShardReport {
            name: shard.to_string(),
            size,
            records,
            error,
        });
    }
    Ok(report)
}

fn print_text_output(result: &InspectResult) {
    println!("OrionDB Database Inspection");
    println!("===========================");
    println!();
    println!("Path: {}", result.path);

    if result.collections.is_empty() {
        println!();
        println!("No collections.");
        return;
    }

    for col in &result.collections {
        println!();
        println!("Collection: {}", col.name);
        println!(
            "  {} records in {} shards, {}",
            col.record_count,
            col.shards.len(),
            format_size(col.total_size)
        );

        match &col.schema {
            Some(schema) if !schema.is_empty() => {
                println!("  Schema:");
                for (field, kind) in schema.iter() {
                    println!("    {field}: {kind}");
                }
            }
            Some(_) => println!("  Schema: (none, records stored as given)"),
            None => println!("  Schema: (missing schema.json)"),
        }

        println!("  Shards:");
        for shard in &col.shards {
            match (&shard.records, &shard.error) {
                (Some(records), _) => println!(
                    "    {:<20} {:>8} records  {}",
                    shard.name,
                    records,
                    format_size(shard.size)
                ),
                (None, Some(error)) => println!("    {:<20} CORRUPT: {error}", shard.name),
                (None, None) => println!("    {}", shard.name),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oriondb_storage::InMemoryBackend;

    #[test]
    fn reports_counts_and_corruption() {
        let backend = InMemoryBackend::new();
        backend.write(SCHEMA_FILE, br#"{"id":"INT"}"#).unwrap();
        backend.write("data_1.shard", br#"[{"id":1},{"id":2}]"#).unwrap();
        backend.write("data_2.shard", b"[{").unwrap();
        backend.write("data_10.shard", br#"[{"id":3}]"#).unwrap();

        let report = inspect_collection("users".into(), &backend).unwrap();
        let names: Vec<&str> = report.shards.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["data_1.shard", "data_2.shard", "data_10.shard"]);
        assert_eq!(report.record_count, 3);
        assert!(report.shards[1].error.is_some());
        assert_eq!(report.schema.unwrap().len(), 1);
    }
}
