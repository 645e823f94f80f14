//! Record commands: insert, search, match, update, remove and get.
//!
//! Records are printed one compact JSON object per line.

use super::open_database;
use oriondb_codec::{encode_record, parse_record, parse_value, Record, Value};
use oriondb_core::{Collection, RecordSet, SelectOptions};
use std::fs;
use std::path::Path;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

fn select(
    path: &Path,
    collection: &str,
    options: SelectOptions,
) -> Result<Collection, Box<dyn std::error::Error>> {
    Ok(open_database(path)?.select_with(collection, options)?)
}

fn print_records(records: &[Record]) -> CommandResult {
    for record in records {
        println!("{}", encode_record(record)?);
    }
    Ok(())
}

/// Interprets a JSON document as a batch of records.
fn records_from_json(text: &str) -> Result<Vec<Record>, Box<dyn std::error::Error>> {
    match parse_value(text)? {
        Value::Object(map) => Ok(vec![Record::from(map)]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(map) => Ok(Record::from(map)),
                other => {
                    Err(format!("element {i} is {}, expected an object", other.type_name()).into())
                }
            })
            .collect(),
        other => {
            Err(format!("expected an object or an array, found {}", other.type_name()).into())
        }
    }
}

/// Inserts the records held in `file`.
pub fn insert(path: &Path, collection: &str, file: &Path) -> CommandResult {
    let records = records_from_json(&fs::read_to_string(file)?)?;
    tracing::debug!(file = %file.display(), records = records.len(), "parsed input file");
    let inserted = select(path, collection, SelectOptions::new())?.insert_many(records)?;
    println!("Inserted {inserted} records into {collection}");
    Ok(())
}

/// Prints records equal to `query`.
pub fn search(path: &Path, collection: &str, query: &str, parallel: bool) -> CommandResult {
    let query = parse_record(query)?;
    let col = select(path, collection, SelectOptions::new().parallel(parallel))?;
    print_records(&col.search(&query)?)
}

/// Prints records whose `field` matches `pattern`, prefixed by position.
pub fn match_field(path: &Path, collection: &str, field: &str, pattern: &str) -> CommandResult {
    let col = select(path, collection, SelectOptions::new())?;
    for hit in col.match_pattern(field, pattern)? {
        println!("{}#{}\t{}", hit.shard, hit.index, encode_record(&hit.record)?);
    }
    Ok(())
}

/// Merges `patch` into records equal to `query`.
pub fn update(path: &Path, collection: &str, query: &str, patch: &str) -> CommandResult {
    let query = parse_record(query)?;
    let patch = parse_record(patch)?;
    let matched = select(path, collection, SelectOptions::new())?.update(&query, &patch)?;
    println!("Updated {matched} records");
    Ok(())
}

/// Deletes records equal to `query`.
pub fn remove(path: &Path, collection: &str, query: &str) -> CommandResult {
    let query = parse_record(query)?;
    let removed = select(path, collection, SelectOptions::new())?.remove(&query)?;
    println!("Removed {removed} records");
    Ok(())
}

/// Prints every record, optionally under per-shard headings.
pub fn get(path: &Path, collection: &str, grouped: bool) -> CommandResult {
    let col = select(path, collection, SelectOptions::new())?;
    match col.get(!grouped)? {
        RecordSet::Flat(records) => print_records(&records),
        RecordSet::ByShard(shards) => {
            let names = col.shard_names()?;
            for (name, records) in names.iter().zip(&shards) {
                println!("# {name} ({} records)", records.len());
                print_records(records)?;
            }
            Ok(())
        }
    }
}
