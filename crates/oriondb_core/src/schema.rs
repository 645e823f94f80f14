//! Collection schemas and value coercion.
//!
//! A schema maps field names to a [`FieldKind`] and lives in the collection's
//! `schema.json`. In strict mode every inserted record is reshaped by
//! [`Schema::coerce`]: fields the schema doesn't mention are dropped, and the
//! remaining ones are converted to their declared kind. A value that can't be
//! converted is stored as `null`; an insert never fails because of its data.
//!
//! ```json
//! { "id": "INT", "name": "STRING", "tags": "JSON" }
//! ```

use crate::error::{CoreError, CoreResult};
use oriondb_codec::{parse_value, Record, Value};
use oriondb_storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Name of the schema file inside a collection directory.
pub const SCHEMA_FILE: &str = "schema.json";

/// Smallest float that no longer fits in an `i64` after truncation.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Declared kind of a schema field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    /// `STRING`: textual representation.
    String,
    /// `INT`: 64-bit integer.
    Int,
    /// `FLOAT`: double precision float.
    Float,
    /// `BOOLEAN`: truthiness.
    Boolean,
    /// `JSON`: embedded JSON document.
    Json,
    /// `BINARY`: array of 32-bit integers.
    Binary,
    /// Any other kind name; values pass through untouched.
    Other(String),
}

impl FieldKind {
    /// Returns the name used in `schema.json`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "STRING",
            Self::Int => "INT",
            Self::Float => "FLOAT",
            Self::Boolean => "BOOLEAN",
            Self::Json => "JSON",
            Self::Binary => "BINARY",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for FieldKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "STRING" => Self::String,
            "INT" => Self::Int,
            "FLOAT" => Self::Float,
            "BOOLEAN" => Self::Boolean,
            "JSON" => Self::Json,
            "BINARY" => Self::Binary,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for FieldKind {
    fn from(name: &str) -> Self {
        Self::from(name.to_owned())
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value could not be converted to its declared kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot coerce {found} to {kind}: {reason}")]
pub struct CoercionError {
    /// The target kind.
    pub kind: FieldKind,
    /// Type name of the rejected value.
    pub found: &'static str,
    /// What went wrong.
    pub reason: String,
}

impl CoercionError {
    fn new(kind: FieldKind, value: &Value, reason: impl Into<String>) -> Self {
        Self {
            kind,
            found: value.type_name(),
            reason: reason.into(),
        }
    }
}

/// Field-to-kind mapping of one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: BTreeMap<String, FieldKind>,
}

impl Schema {
    /// Creates a schema with no fields, which disables coercion.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a schema from `(field, kind)` pairs.
    pub fn from_fields<I, F, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (F, K)>,
        F: Into<String>,
        K: Into<FieldKind>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(f, k)| (f.into(), k.into()))
                .collect(),
        }
    }

    /// Returns true if the schema declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns the declared kind of a field.
    pub fn get(&self, field: &str) -> Option<&FieldKind> {
        self.fields.get(field)
    }

    /// Iterates over declared fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldKind)> {
        self.fields.iter()
    }

    /// Loads `schema.json`, writing an empty schema first if the file is
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptMetadata`] if the file is not an object of
    /// strings.
    pub fn load_or_init(backend: &dyn StorageBackend) -> CoreResult<Self> {
        if !backend.exists(SCHEMA_FILE)? {
            backend.write(SCHEMA_FILE, b"{}")?;
            return Ok(Self::empty());
        }
        let bytes = backend.read(SCHEMA_FILE)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::corrupt_metadata(SCHEMA_FILE, e.to_string()))
    }

    /// Writes this schema to `schema.json`.
    pub fn save(&self, backend: &dyn StorageBackend) -> CoreResult<()> {
        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| CoreError::corrupt_metadata(SCHEMA_FILE, e.to_string()))?;
        backend.write(SCHEMA_FILE, &bytes)?;
        Ok(())
    }

    /// Reshapes a record to this schema.
    ///
    /// An empty schema returns the record unchanged. Otherwise the result
    /// holds only fields that are both declared and present, each converted
    /// to its kind; failed conversions become `null`.
    pub fn coerce(&self, record: Record) -> Record {
        if self.is_empty() {
            return record;
        }

        let mut out = Record::new();
        for (field, kind) in &self.fields {
            let Some(value) = record.get(field) else {
                continue;
            };
            let coerced = match coerce_value(kind, value) {
                Ok(coerced) => coerced,
                Err(err) => {
                    tracing::warn!(field = %field, error = %err, "coercion failed, storing null");
                    Value::Null
                }
            };
            out.insert(field.clone(), coerced);
        }
        out
    }
}

/// Converts one value to `kind`.
pub fn coerce_value(kind: &FieldKind, value: &Value) -> Result<Value, CoercionError> {
    match kind {
        FieldKind::String => Ok(Value::Text(value.to_text())),
        FieldKind::Int => to_int(value).map(Value::Integer),
        FieldKind::Float => to_float(value).map(Value::Float),
        FieldKind::Boolean => Ok(Value::Bool(to_bool(value))),
        FieldKind::Json => match value {
            Value::Text(text) => parse_value(text)
                .map_err(|e| CoercionError::new(kind.clone(), value, e.to_string())),
            other => Ok(other.clone()),
        },
        FieldKind::Binary => to_binary(value).map(Value::Array),
        FieldKind::Other(_) => Ok(value.clone()),
    }
}

fn to_int(value: &Value) -> Result<i64, CoercionError> {
    let fail = |reason: &str| CoercionError::new(FieldKind::Int, value, reason);
    match value {
        Value::Integer(n) => Ok(*n),
        Value::Float(f) => truncate(*f).ok_or_else(|| fail("out of integer range")),
        Value::Text(text) => {
            let prefix = integer_prefix(text.trim_start());
            if prefix.is_empty() || prefix == "-" || prefix == "+" {
                return Err(fail("no leading integer"));
            }
            prefix.parse().map_err(|_| fail("out of integer range"))
        }
        _ => Err(fail("not a number")),
    }
}

fn to_float(value: &Value) -> Result<f64, CoercionError> {
    let fail = |reason: &str| CoercionError::new(FieldKind::Float, value, reason);
    let parsed = match value {
        #[allow(clippy::cast_precision_loss)]
        Value::Integer(n) => *n as f64,
        Value::Float(f) => *f,
        Value::Text(text) => decimal_prefix(text.trim_start())
            .and_then(|p| p.parse::<f64>().ok())
            .ok_or_else(|| fail("no leading number"))?,
        _ => return Err(fail("not a number")),
    };
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(fail("not finite"))
    }
}

fn to_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Integer(n) => *n != 0,
        Value::Float(f) => *f != 0.0 && !f.is_nan(),
        Value::Text(text) => {
            if text.eq_ignore_ascii_case("true") {
                true
            } else if text.eq_ignore_ascii_case("false") {
                false
            } else {
                !(text.is_empty() || text == "0")
            }
        }
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn to_binary(value: &Value) -> Result<Vec<Value>, CoercionError> {
    match value {
        Value::Array(items) => Ok(items
            .iter()
            .map(|item| Value::Integer(i64::from(binary_element(item))))
            .collect()),
        Value::Text(text) => Ok(text
            .bytes()
            .map(|b| Value::Integer(i64::from(b)))
            .collect()),
        other => Err(CoercionError::new(
            FieldKind::Binary,
            other,
            "expected an array or a string",
        )),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn binary_element(item: &Value) -> i32 {
    match item {
        Value::Integer(n) => *n as i32,
        Value::Float(f) => float_to_i32(*f),
        Value::Bool(b) => i32::from(*b),
        Value::Text(text) => text.trim().parse::<f64>().map_or(0, float_to_i32),
        _ => 0,
    }
}

/// Truncates and wraps to 32 bits; non-finite input maps to zero.
#[allow(clippy::cast_possible_truncation)]
fn float_to_i32(f: f64) -> i32 {
    if f.is_finite() {
        (f.trunc() as i64) as i32
    } else {
        0
    }
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(f: f64) -> Option<i64> {
    let t = f.trunc();
    (t.is_finite() && t >= -I64_BOUND && t < I64_BOUND).then(|| t as i64)
}

fn sign_len(s: &str) -> usize {
    usize::from(s.starts_with(['+', '-']))
}

fn digits_len(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

/// The longest prefix of the form `[+-]?digits`.
fn integer_prefix(s: &str) -> &str {
    let sign = sign_len(s);
    &s[..sign + digits_len(&s[sign..])]
}

/// The longest prefix of the form `[+-]?digits[.digits][e[+-]digits]` with at
/// least one mantissa digit.
fn decimal_prefix(s: &str) -> Option<&str> {
    let mut end = sign_len(s);
    let int_digits = digits_len(&s[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if s[end..].starts_with('.') {
        frac_digits = digits_len(&s[end + 1..]);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if s[end..].starts_with(['e', 'E']) {
        let exp_start = end + 1;
        let exp_sign = sign_len(&s[exp_start..]);
        let exp_digits = digits_len(&s[exp_start + exp_sign..]);
        if exp_digits > 0 {
            end = exp_start + exp_sign + exp_digits;
        }
    }
    Some(&s[..end])
}
