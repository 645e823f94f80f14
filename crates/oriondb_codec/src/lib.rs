//! # OrionDB Codec
//!
//! Dynamic value model and JSON shard encoding for OrionDB.
//!
//! This crate provides:
//! - [`Value`], a tagged union over the JSON data model that keeps integers
//!   and floats apart
//! - [`Record`], an open map of field names to values with ordered keys
//! - Encoding and decoding of shard files (a JSON array of records)
//!
//! ## Usage
//!
//! ```
//! use oriondb_codec::{decode_records, encode_records, record};
//!
//! let records = vec![record! { "id" => 1, "name" => "ada" }];
//! let bytes = encode_records(&records).unwrap();
//!
//! let decoded = decode_records(&bytes).unwrap();
//! assert_eq!(decoded, records);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod json;
mod record;
mod value;

pub use error::{CodecError, CodecResult};
pub use json::{decode_records, encode_record, encode_records, parse_record, parse_value};
pub use record::Record;
pub use value::Value;
