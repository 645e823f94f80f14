//! # OrionDB Storage
//!
//! Storage backend trait and implementations for OrionDB.
//!
//! This crate provides the lowest-level storage abstraction for OrionDB.
//! Storage backends are **opaque named-blob stores** - they do not interpret
//! the data they store.
//!
//! ## Design Principles
//!
//! - Backends are simple blob stores (list, read, replace)
//! - No knowledge of shards, schemas or records
//! - Must be `Send + Sync` so parallel scans can share one handle
//! - OrionDB owns all file format interpretation
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`DirectoryBackend`] - For persistent storage, one file per blob
//!
//! ## Example
//!
//! ```rust
//! use oriondb_storage::{InMemoryBackend, StorageBackend};
//!
//! let backend = InMemoryBackend::new();
//! backend.write("schema.json", b"{}").unwrap();
//! assert_eq!(backend.read("schema.json").unwrap(), b"{}");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod dir;
mod error;
mod memory;

pub use backend::StorageBackend;
pub use dir::DirectoryBackend;
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryBackend;

/// Suffix of in-flight temporary files; never listed as blobs.
pub const TEMP_SUFFIX: &str = ".tmp";
