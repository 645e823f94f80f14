//! Property-based test generators using proptest.
//!
//! Provides strategies for values, records, queries and operation sequences.
//! Generated records draw their keys from a small fixed set so queries
//! actually hit something.

use oriondb_codec::{Record, Value};
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Field names used by generated records and queries.
pub const FIELD_NAMES: &[&str] = &["id", "name", "kind", "score", "flag", "tags"];

/// Strategy for generating valid collection names.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_-]{0,31}").expect("Invalid regex")
}

/// Strategy for scalar values. Floats are finite and small enough to survive
/// a JSON round trip exactly.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(Value::Integer),
        (-1.0e6f64..1.0e6).prop_map(Value::Float),
        "[a-z]{0,8}".prop_map(Value::Text),
    ]
}

/// Strategy for arbitrary values, nesting arrays and objects a few levels.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Object),
        ]
    })
}

fn field_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(FIELD_NAMES).prop_map(str::to_owned)
}

/// Strategy for records with keys from [`FIELD_NAMES`].
pub fn record_strategy() -> impl Strategy<Value = Record> {
    prop::collection::btree_map(field_strategy(), value_strategy(), 0..FIELD_NAMES.len())
        .prop_map(Record::from)
}

/// Strategy for equality queries: zero to two scalar constraints.
///
/// Values come from a narrow range so that they collide with generated
/// records reasonably often.
pub fn query_strategy() -> impl Strategy<Value = Record> {
    let narrow = prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        (-3i64..3).prop_map(Value::Integer),
        "[ab]{0,1}".prop_map(Value::Text),
        Just(Value::Null),
    ];
    prop::collection::btree_map(field_strategy(), narrow, 0..3)
        .prop_map(|fields: BTreeMap<String, Value>| Record::from(fields))
}

/// Strategy for records dense in the narrow query values.
pub fn queryable_record_strategy() -> impl Strategy<Value = Record> {
    let narrow = prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        (-3i64..3).prop_map(Value::Integer),
        "[ab]{0,1}".prop_map(Value::Text),
        Just(Value::Null),
        value_strategy(),
    ];
    prop::collection::btree_map(field_strategy(), narrow, 0..FIELD_NAMES.len())
        .prop_map(Record::from)
}

/// A mutating operation on a collection.
#[derive(Debug, Clone)]
pub enum CollectionOperation {
    /// Insert a batch of records.
    Insert(Vec<Record>),
    /// Merge a patch into every record matching a query.
    Update {
        /// Which records to touch.
        query: Record,
        /// Fields to set.
        patch: Record,
    },
    /// Delete every record matching a query.
    Remove {
        /// Which records to delete.
        query: Record,
    },
}

/// Strategy for generating collection operations.
pub fn collection_operation_strategy() -> impl Strategy<Value = CollectionOperation> {
    prop_oneof![
        3 => prop::collection::vec(queryable_record_strategy(), 0..12)
            .prop_map(CollectionOperation::Insert),
        2 => (query_strategy(), queryable_record_strategy())
            .prop_map(|(query, patch)| CollectionOperation::Update { query, patch }),
        1 => query_strategy().prop_map(|query| CollectionOperation::Remove { query }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<CollectionOperation>> {
    prop::collection::vec(collection_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oriondb_core::validate_collection_name;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn collection_name_is_valid(name in collection_name_strategy()) {
            prop_assert!(validate_collection_name(&name).is_ok());
        }

        #[test]
        fn records_use_known_fields(record in record_strategy()) {
            prop_assert!(record.keys().all(|k| FIELD_NAMES.contains(&k.as_str())));
        }

        #[test]
        fn queries_are_scalar(query in query_strategy()) {
            prop_assert!(query.len() <= 2);
            prop_assert!(query.iter().all(|(_, v)| !v.is_structured()));
        }
    }
}
