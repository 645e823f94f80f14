//! # OrionDB Core
//!
//! Collection engine for OrionDB, an embedded document store that keeps
//! records as JSON in fixed-capacity shard files.
//!
//! This crate provides:
//! - [`Database`] and [`Collection`] handles
//! - Shard naming, discovery and persistence ([`shard`])
//! - A bounded LRU cache of decoded shards
//! - Schema coercion for strict collections ([`schema`])
//! - Equality search (serial or over a bounded thread pool), regex field
//!   matching, update, remove and full reads ([`query`])
//!
//! ## Example
//!
//! ```no_run
//! use oriondb_codec::record;
//! use oriondb_core::Database;
//!
//! # fn main() -> oriondb_core::CoreResult<()> {
//! let db = Database::open("data")?;
//! let users = db.select("users")?;
//!
//! users.insert(record! { "id" => 7777, "name" => "ada" })?;
//! users.update(&record! { "id" => 7777 }, &record! { "flag" => true })?;
//!
//! let found = users.search(&record! { "flag" => true })?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
mod database;
mod dir;
mod error;
pub mod query;
pub mod schema;
pub mod shard;
mod stats;

pub use collection::{Collection, INDEX_FILE};
pub use config::{default_max_threads, Config, SelectOptions, DEFAULT_CACHE_LIMIT, DEFAULT_SHARD_SIZE};
pub use database::Database;
pub use dir::{validate_collection_name, DatabaseDir};
pub use error::{CoreError, CoreResult};
pub use query::{matches, MatchHit, ParallelSearch, RecordSet};
pub use schema::{coerce_value, CoercionError, FieldKind, Schema, SCHEMA_FILE};
pub use shard::{ShardCache, ShardData, ShardName, ShardStore};
pub use stats::{CollectionStats, StatsSnapshot};

/// Crate version, as reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
