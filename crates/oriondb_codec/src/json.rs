//! JSON encoding for shard files and embedded values.
//!
//! A shard file is a JSON array of objects, pretty-printed with two-space
//! indentation so it stays readable and diffable.

use crate::error::{CodecError, CodecResult};
use crate::record::Record;
use crate::value::Value;

/// Encodes a shard's records as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if a record holds a non-finite float.
pub fn encode_records(records: &[Record]) -> CodecResult<Vec<u8>> {
    serde_json::to_vec_pretty(records).map_err(encode_error)
}

/// Decodes a shard file back into its records.
///
/// # Errors
///
/// Returns [`CodecError::DecodingFailed`] if the bytes are not a JSON array
/// whose elements are all objects.
pub fn decode_records(bytes: &[u8]) -> CodecResult<Vec<Record>> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

/// Encodes a single record as compact JSON.
///
/// # Errors
///
/// Returns an error if the record holds a non-finite float.
pub fn encode_record(record: &Record) -> CodecResult<String> {
    serde_json::to_string(record).map_err(encode_error)
}

/// Parses JSON text into a [`Value`].
///
/// # Errors
///
/// Returns [`CodecError::DecodingFailed`] on malformed input.
pub fn parse_value(text: &str) -> CodecResult<Value> {
    serde_json::from_str(text).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

/// Parses JSON text that must hold a single object.
///
/// # Errors
///
/// Returns [`CodecError::DecodingFailed`] on malformed input or a non-object.
pub fn parse_record(text: &str) -> CodecResult<Record> {
    serde_json::from_str(text).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

fn encode_error(err: serde_json::Error) -> CodecError {
    if err.to_string().contains("non-finite") {
        CodecError::NonFiniteFloat
    } else {
        CodecError::encoding_failed(err.to_string())
    }
}
