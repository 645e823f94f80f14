//! # OrionDB Testkit
//!
//! Test utilities for OrionDB.
//!
//! This crate provides:
//! - Temporary-directory database fixtures
//! - Property-based test generators using proptest
//! - A model-checking harness and end-to-end scenarios spanning the storage,
//!   codec and core crates
//!
//! ## Usage
//!
//! ```rust
//! use oriondb_testkit::prelude::*;
//!
//! let test_db = scenarios::populated_database(100, 30);
//! let items = test_db.collection("items");
//! assert_eq!(items.shard_names().unwrap().len(), 4);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
