//! Record type: an open, ordered map of field names to values.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// A single document stored in a shard.
///
/// Records have no required fields. Keys are kept sorted, so two records with
/// the same fields always encode to the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `field`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Sets `field`, returning the previous value if there was one.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Removes `field`, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Returns true if the record has `field`.
    pub fn contains_key(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over fields in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Iterates over field names in key order.
    pub fn keys(&self) -> btree_map::Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Copies every field of `patch` into this record.
    ///
    /// Existing fields are overwritten and new ones added; nothing is
    /// removed. Returns true if the record changed. A field counts as
    /// changed when its variant differs, so `2.0` replaces a stored `2`.
    pub fn merge(&mut self, patch: &Record) -> bool {
        let mut changed = false;
        for (field, value) in patch.iter() {
            if !self.0.get(field).is_some_and(|old| old.identical(value)) {
                self.0.insert(field.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }

    /// Consumes the record, returning the underlying map.
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Builds a [`Record`] from `field => value` pairs.
///
/// ```
/// use oriondb_codec::{record, Value};
///
/// let user = record! { "id" => 1, "name" => "ada" };
/// assert_eq!(user.get("name"), Some(&Value::from("ada")));
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($field:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(record.insert($field, $value);)+
        record
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn merge_overwrites_and_adds() {
        let mut target = record! { "id" => 1, "name" => "old" };
        let patch = record! { "name" => "new", "flag" => true };

        assert!(target.merge(&patch));
        assert_eq!(target.get("id"), Some(&Value::Integer(1)));
        assert_eq!(target.get("name"), Some(&Value::from("new")));
        assert_eq!(target.get("flag"), Some(&Value::Bool(true)));
    }

    #[test]
    fn merge_reports_no_change() {
        let mut target = record! { "id" => 1, "flag" => true };
        let patch = record! { "flag" => true };
        assert!(!target.merge(&patch));
        assert!(!target.merge(&Record::new()));
    }

    #[test]
    fn merge_replaces_integer_with_float() {
        let mut target = record! { "id" => 1, "score" => 2 };
        assert!(target.merge(&record! { "score" => 2.0 }));
        assert!(matches!(target.get("score"), Some(Value::Float(f)) if *f == 2.0));
        assert!(!target.merge(&record! { "score" => 2.0 }));
    }

    #[test]
    fn serializes_as_plain_object() {
        let rec = record! { "b" => 2, "a" => "x" };
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"a":"x","b":2}"#);

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn rejects_non_object_json() {
        assert!(serde_json::from_str::<Record>("[1,2]").is_err());
        assert!(serde_json::from_str::<Record>("7").is_err());
    }

    #[test]
    fn collects_from_pairs() {
        let rec: Record = [("k", 1), ("j", 2)].into_iter().collect();
        assert_eq!(rec.len(), 2);
        assert_eq!(rec.keys().next().map(String::as_str), Some("j"));
    }
}
