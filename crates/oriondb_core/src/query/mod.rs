//! Record queries.
//!
//! A query is itself a [`Record`]: a record matches when every query field is
//! present in it with a strictly equal value (see [`Value::strict_eq`]). The
//! empty query matches everything.
//!
//! The operations live on [`crate::Collection`]; this module holds the
//! predicate, the result types and the parallel scan.
//!
//! [`Value::strict_eq`]: oriondb_codec::Value::strict_eq

mod executor;
mod parallel;

pub use parallel::ParallelSearch;

use crate::shard::ShardName;
use oriondb_codec::Record;

/// Returns true if `record` satisfies every field of `query`.
pub fn matches(record: &Record, query: &Record) -> bool {
    query.iter().all(|(field, expected)| {
        record
            .get(field)
            .is_some_and(|actual| actual.strict_eq(expected))
    })
}

/// A record found by a field match, with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchHit {
    /// Shard holding the record.
    pub shard: ShardName,
    /// Position of the record within the shard.
    pub index: usize,
    /// The record itself.
    pub record: Record,
}

/// Result of reading a whole collection.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSet {
    /// All records, shard after shard.
    Flat(Vec<Record>),
    /// One vector per shard, in shard order.
    ByShard(Vec<Vec<Record>>),
}

impl RecordSet {
    /// Total number of records.
    pub fn len(&self) -> usize {
        match self {
            Self::Flat(records) => records.len(),
            Self::ByShard(shards) => shards.iter().map(Vec::len).sum(),
        }
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens into a single vector in shard order.
    pub fn into_flat(self) -> Vec<Record> {
        match self {
            Self::Flat(records) => records,
            Self::ByShard(shards) => shards.into_iter().flatten().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oriondb_codec::{record, Value};

    #[test]
    fn all_fields_must_match() {
        let rec = record! { "id" => 1, "name" => "ada", "flag" => true };

        assert!(matches(&rec, &record! { "id" => 1 }));
        assert!(matches(&rec, &record! { "id" => 1, "flag" => true }));
        assert!(!matches(&rec, &record! { "id" => 1, "flag" => false }));
        assert!(!matches(&rec, &record! { "id" => "1" }));
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(matches(&record! {}, &record! {}));
        assert!(matches(&record! { "a" => 1 }, &record! {}));
    }

    #[test]
    fn missing_field_never_matches() {
        let rec = record! { "id" => 1 };
        assert!(!matches(&rec, &record! { "other" => Value::Null }));
    }

    #[test]
    fn numbers_compare_numerically() {
        assert!(matches(&record! { "n" => 2.0 }, &record! { "n" => 2 }));
        assert!(!matches(&record! { "n" => 2.5 }, &record! { "n" => 2 }));
    }

    #[test]
    fn structures_never_match() {
        let tags = Value::Array(vec![Value::from("a")]);
        let rec = record! { "tags" => tags.clone() };
        assert!(!matches(&rec, &record! { "tags" => tags }));
    }

    #[test]
    fn record_set_flattening() {
        let grouped = RecordSet::ByShard(vec![
            vec![record! { "i" => 0 }],
            vec![],
            vec![record! { "i" => 1 }, record! { "i" => 2 }],
        ]);
        assert_eq!(grouped.len(), 3);

        let flat = grouped.into_flat();
        let ids: Vec<_> = flat.iter().filter_map(|r| r.get("i")?.as_integer()).collect();
        assert_eq!(ids, [0, 1, 2]);
        assert!(RecordSet::Flat(vec![]).is_empty());
    }
}
